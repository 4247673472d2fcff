//! ocrsheet CLI

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ocrsheet::core::config::{ConfigStore, dotted_value, merge_values};
use ocrsheet::export::write_csv;
use ocrsheet::ocr::TextRecognizer;
use ocrsheet::pdf::PdfRenderOptions;
use ocrsheet::{AppConfig, Applied, Orchestrator, Table, ThresholdMethod, Workspace, infer_table, load_input, preprocess};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Thresholding method accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliThreshold {
    /// Gaussian-weighted local threshold
    Adaptive,
    /// Global Otsu threshold
    Otsu,
    /// Fixed level of 150
    Fixed,
}

impl From<CliThreshold> for ThresholdMethod {
    fn from(method: CliThreshold) -> Self {
        match method {
            CliThreshold::Adaptive => ThresholdMethod::Adaptive,
            CliThreshold::Otsu => ThresholdMethod::Otsu,
            CliThreshold::Fixed => ThresholdMethod::Fixed,
        }
    }
}

/// How a table is printed to stdout
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Markdown,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "ocrsheet")]
#[command(version, about = "Turn scanned tables into spreadsheets", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Per-run overrides layered over the settings file
#[derive(clap::Args, Debug, Default)]
struct JobArgs {
    /// OCR language, e.g. `eng` or `eng+deu`
    #[arg(short, long)]
    lang: Option<String>,

    /// Page segmentation mode
    #[arg(long)]
    psm: Option<i32>,

    /// OCR engine mode
    #[arg(long)]
    oem: Option<i32>,

    /// Thresholding method
    #[arg(short, long, value_enum)]
    threshold: Option<CliThreshold>,

    /// Skip deskewing
    #[arg(long)]
    no_deskew: bool,

    /// PDF rendering resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// First PDF page to read (1-based)
    #[arg(long)]
    first_page: Option<u32>,

    /// Last PDF page to read (1-based, inclusive)
    #[arg(long)]
    last_page: Option<u32>,
}

impl JobArgs {
    fn overrides(&self) -> Result<Value> {
        let mut overrides = Value::Object(Map::new());
        let mut add = |key: &str, value: Value| -> Result<()> {
            merge_values(&mut overrides, dotted_value(key, value)?);
            Ok(())
        };

        if let Some(lang) = &self.lang {
            add("ocr.language", json!(lang))?;
        }
        if let Some(psm) = self.psm {
            add("ocr.psm", json!(psm))?;
        }
        if let Some(oem) = self.oem {
            add("ocr.oem", json!(oem))?;
        }
        if let Some(dpi) = self.dpi {
            add("ocr.dpi", json!(dpi))?;
        }
        if let Some(threshold) = self.threshold {
            add("preprocessing.threshold", json!(ThresholdMethod::from(threshold).as_str()))?;
        }
        if self.no_deskew {
            add("preprocessing.deskew", json!(false))?;
        }
        Ok(overrides)
    }

    fn pdf_options(&self, config: &AppConfig) -> PdfRenderOptions {
        PdfRenderOptions {
            dpi: config.ocr.dpi,
            first_page: self.first_page,
            last_page: self.last_page,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize a table in an image or PDF
    Process {
        /// Image or PDF file
        input: PathBuf,

        #[command(flatten)]
        job: JobArgs,

        /// Export the table as an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Export the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Save the recognized text
        #[arg(long)]
        text: Option<PathBuf>,

        /// Format of the table printed to stdout
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Run only the preprocessing pipeline and save the result
    Preprocess {
        /// Image or PDF file
        input: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Build a table from plain text
    Infer {
        /// Text file (use `-` for stdin)
        input: PathBuf,

        /// Export the table as an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Export the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Format of the table printed to stdout
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Render PDF pages to PNG files
    #[cfg(feature = "pdf")]
    Render {
        /// PDF file
        input: PathBuf,

        /// Directory for the page images
        #[arg(short, long, default_value = "pages")]
        out_dir: PathBuf,

        /// Rendering resolution
        #[arg(long, default_value = "300")]
        dpi: u32,

        /// First page (1-based)
        #[arg(long)]
        first_page: Option<u32>,

        /// Last page (1-based, inclusive)
        #[arg(long)]
        last_page: Option<u32>,
    },

    /// Inspect or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Print one setting, e.g. `ocr.psm`
    Get { key: String },
    /// Change one setting and save the file
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Process {
            input,
            job,
            xlsx,
            csv,
            text,
            format,
        } => {
            let mut store = ConfigStore::load_or_default(config_path)?;
            let config = store.with_overrides(job.overrides()?)?;

            let mut workspace = Workspace::new();
            workspace
                .load(&input, &job.pdf_options(&config))
                .with_context(|| format!("Cannot load {}", input.display()))?;
            store.remember_last_folder(&input)?;
            let recognizer = build_recognizer(&config)?;

            let (orchestrator, mut events) = Orchestrator::new(recognizer);
            let job_id = workspace
                .process(&orchestrator, config.job_config())?
                .context("Another OCR job is already running")?;

            while let Some(event) = events.recv().await {
                match workspace.apply(event) {
                    Applied::Progress => {
                        if let Some(update) = workspace.last_progress() {
                            eprintln!("[{:>3}%] {}", update.percent, update.message);
                        }
                    }
                    Applied::Completed => break,
                    Applied::Failed(message) => bail!("OCR job {} failed: {}", job_id, message),
                    Applied::Ignored => {}
                }
            }

            let table = workspace.table();
            print_table(table, format)?;

            let mut targets: Vec<PathBuf> = xlsx.into_iter().chain(csv).collect();
            if targets.is_empty() {
                targets.extend(auto_export_path(&config, &input));
            }
            for path in targets {
                if table.is_empty() {
                    eprintln!("No table recognized; nothing exported");
                    break;
                }
                workspace.export(&path)?;
                eprintln!("Exported {}", path.display());
            }
            if let Some(path) = text {
                workspace.save_text(&path)?;
                eprintln!("Saved {}", path.display());
            }
            Ok(())
        }

        Commands::Preprocess { input, output, job } => {
            let store = ConfigStore::load_or_default(config_path)?;
            let config = store.with_overrides(job.overrides()?)?;
            let raw = load_input(&input, &job.pdf_options(&config))
                .with_context(|| format!("Cannot load {}", input.display()))?;

            let processed = preprocess(raw.image(), &config.preprocessing);
            if let Some(reason) = &processed.fallback {
                eprintln!("Preprocessing fell back to grayscale: {}", reason);
            }
            if let Some(angle) = processed.skew_angle {
                eprintln!("Deskewed by {:.2} degrees", angle);
            }
            processed
                .image
                .save(&output)
                .with_context(|| format!("Cannot write {}", output.display()))?;
            println!("{}", output.display());
            Ok(())
        }

        Commands::Infer {
            input,
            xlsx,
            csv,
            format,
        } => {
            let text = if input.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin()).context("Cannot read stdin")?
            } else {
                std::fs::read_to_string(&input).with_context(|| format!("Cannot read {}", input.display()))?
            };
            let table = infer_table(&text);
            print_table(&table, format)?;
            if let Some(path) = xlsx {
                ocrsheet::export_xlsx(&table, &path)?;
            }
            if let Some(path) = csv {
                ocrsheet::export_csv(&table, &path)?;
            }
            Ok(())
        }

        #[cfg(feature = "pdf")]
        Commands::Render {
            input,
            out_dir,
            dpi,
            first_page,
            last_page,
        } => {
            let options = PdfRenderOptions {
                dpi,
                first_page,
                last_page,
            };
            let total = ocrsheet::pdf::page_count(&input)?;
            let pages = ocrsheet::pdf::render_pdf_file(&input, &options)?;
            eprintln!("Rendering {} of {} pages at {} dpi", pages.len(), total, dpi);
            std::fs::create_dir_all(&out_dir).with_context(|| format!("Cannot create {}", out_dir.display()))?;

            let first = first_page.unwrap_or(1);
            for (offset, page) in (0u32..).zip(pages.iter()) {
                let name = ocrsheet::pdf::page_file_name(first + offset, image::ImageFormat::Png);
                let path = out_dir.join(name);
                page.save(&path)
                    .with_context(|| format!("Cannot write {}", path.display()))?;
                println!("{}", path.display());
            }
            Ok(())
        }

        Commands::Config(command) => run_config(command, config_path),
    }
}

fn run_config(command: ConfigCommand, config_path: Option<&Path>) -> Result<()> {
    let mut store = ConfigStore::load_or_default(config_path)?;
    match command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(store.value())?);
        }
        ConfigCommand::Get { key } => match store.get(&key) {
            Some(Value::String(value)) => println!("{}", value),
            Some(value) => println!("{}", value),
            None => bail!("Unknown setting '{}'", key),
        },
        ConfigCommand::Set { key, value } => {
            store.set_from_str(&key, &value)?;
            eprintln!("Updated {} in {}", key, store.path().display());
        }
        ConfigCommand::Path => {
            println!("{}", store.path().display());
        }
    }
    Ok(())
}

fn print_table(table: &Table, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Markdown => print!("{}", table.to_markdown()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(table)?),
        OutputFormat::Csv => {
            if !table.is_empty() {
                write_csv(table, std::io::stdout().lock())?;
            }
        }
    }
    Ok(())
}

/// Target of `app.auto_export`: `<export_folder>/<input stem>.xlsx`.
fn auto_export_path(config: &AppConfig, input: &Path) -> Option<PathBuf> {
    if !config.app.auto_export {
        return None;
    }
    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let folder = PathBuf::from(&config.paths.export_folder);
    if let Err(e) = std::fs::create_dir_all(&folder) {
        tracing::warn!("Cannot create export folder {}: {}", folder.display(), e);
        return None;
    }
    Some(folder.join(format!("{}.xlsx", stem)))
}

#[cfg(feature = "ocr")]
fn build_recognizer(config: &AppConfig) -> Result<Arc<dyn TextRecognizer>> {
    let recognizer = ocrsheet::TesseractRecognizer::new(config.tessdata_dir());
    tracing::debug!(version = %ocrsheet::TesseractRecognizer::version(), "Using Tesseract");
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "ocr"))]
fn build_recognizer(_config: &AppConfig) -> Result<Arc<dyn TextRecognizer>> {
    Err(ocrsheet::OcrSheetError::MissingDependency(
        "this build has no OCR engine; rebuild with `--features ocr`".to_string(),
    )
    .into())
}
