//! Configuration loading and persistence.
//!
//! Settings live in one file with five sections (`app`, `paths`, `ocr`,
//! `preprocessing`, `ui`). JSON is the default format; `.toml`, `.yaml` and
//! `.yml` files are read and written in their own format.
//!
//! The effective configuration is a layered merge: built-in defaults, then
//! the file, then caller overrides (typically command-line flags). Keys
//! missing from the file are backfilled from the defaults on load, and every
//! [`ConfigStore::set`] writes the file back immediately.
//!
//! # Example
//!
//! ```rust,no_run
//! use ocrsheet::core::config::ConfigStore;
//! use serde_json::json;
//!
//! # fn main() -> ocrsheet::Result<()> {
//! let mut store = ConfigStore::load("settings.json")?;
//! store.set("ocr.language", json!("deu"))?;
//!
//! let job = store.config().job_config();
//! assert_eq!(job.recognition.language, "deu");
//! # Ok(())
//! # }
//! ```
use crate::ocr::RecognitionParams;
use crate::preprocess::PreprocessConfig;
use crate::{OcrSheetError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "ocrsheet";

/// Default settings file name.
pub const CONFIG_FILE_NAME: &str = "settings.json";

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub ocr: OcrSettings,
    #[serde(default)]
    pub preprocessing: PreprocessConfig,
    #[serde(default)]
    pub ui: UiSettings,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_app_language")]
    pub language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default)]
    pub auto_export: bool,
}

/// File system locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Tesseract installation directory, if not on the default search path.
    #[serde(default)]
    pub tesseract: String,
    /// Folder of the most recently loaded image.
    #[serde(default)]
    pub last_folder: String,
    #[serde(default = "default_export_folder")]
    pub export_folder: String,
    /// Language data directory; empty means auto-detect.
    #[serde(default)]
    pub tessdata: String,
}

/// Recognizer parameters.
///
/// `psm`, `oem` and `dpi` accept numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrSettings {
    #[serde(default = "default_ocr_language")]
    pub language: String,
    #[serde(default = "default_psm", deserialize_with = "lenient_int")]
    pub psm: i32,
    #[serde(default = "default_oem", deserialize_with = "lenient_int")]
    pub oem: i32,
    /// Rendering resolution for PDF input.
    #[serde(default = "default_dpi", deserialize_with = "lenient_int")]
    pub dpi: u32,
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_true")]
    pub alternate_colors: bool,
}

fn default_true() -> bool {
    true
}
fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
fn default_app_language() -> String {
    "en".to_string()
}
fn default_theme() -> String {
    "light".to_string()
}
fn default_export_folder() -> String {
    "exports".to_string()
}
fn default_ocr_language() -> String {
    "eng".to_string()
}
fn default_psm() -> i32 {
    6
}
fn default_oem() -> i32 {
    3
}
fn default_dpi() -> u32 {
    300
}
fn default_font_size() -> u32 {
    10
}
fn default_font_family() -> String {
    "sans-serif".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            language: default_app_language(),
            theme: default_theme(),
            auto_save: true,
            auto_export: false,
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            tesseract: String::new(),
            last_folder: String::new(),
            export_folder: default_export_folder(),
            tessdata: String::new(),
        }
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: default_ocr_language(),
            psm: default_psm(),
            oem: default_oem(),
            dpi: default_dpi(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            font_family: default_font_family(),
            show_grid: true,
            alternate_colors: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn lenient_int<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + FromStr,
{
    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(value) => {
            T::try_from(value).map_err(|_| D::Error::custom(format!("integer {} out of range", value)))
        }
        IntOrString::Str(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got '{}'", raw))),
    }
}

/// Per-job snapshot of everything the pipeline reads from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub preprocess: PreprocessConfig,
    pub recognition: RecognitionParams,
    pub dpi: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        AppConfig::default().job_config()
    }
}

impl AppConfig {
    /// Snapshot the values a job needs.
    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            preprocess: self.preprocessing.clone(),
            recognition: RecognitionParams {
                language: self.ocr.language.clone(),
                psm: self.ocr.psm,
                oem: self.ocr.oem,
            },
            dpi: self.ocr.dpi,
        }
    }

    /// Configured tessdata directory, if any.
    pub fn tessdata_dir(&self) -> Option<PathBuf> {
        let trimmed = self.paths.tessdata.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.dpi == 0 {
            return Err(OcrSheetError::validation("ocr.dpi must be greater than 0"));
        }
        let pre = &self.preprocessing;
        if !pre.contrast.is_finite() || pre.contrast < 0.0 {
            return Err(OcrSheetError::validation(format!(
                "preprocessing.contrast must be a non-negative number, got {}",
                pre.contrast
            )));
        }
        if !pre.brightness.is_finite() || pre.brightness < 0.0 {
            return Err(OcrSheetError::validation(format!(
                "preprocessing.brightness must be a non-negative number, got {}",
                pre.brightness
            )));
        }
        Ok(())
    }

    /// Parse a configuration from a JSON value tree.
    pub fn from_value(value: &Value) -> Result<Self> {
        let config: AppConfig = serde_json::from_value(value.clone())
            .map_err(|e| OcrSheetError::validation_with_source(format!("Invalid configuration: {}", e), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration as a JSON value tree.
    pub fn defaults_value() -> Result<Value> {
        Ok(serde_json::to_value(AppConfig::default())?)
    }
}

/// On-disk format of a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything unknown is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("toml") => ConfigFormat::Toml,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }

    fn parse(&self, content: &str, path: &Path) -> Result<Value> {
        match self {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| OcrSheetError::validation(format!("Invalid JSON in {}: {}", path.display(), e))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| OcrSheetError::validation(format!("Invalid TOML in {}: {}", path.display(), e))),
            ConfigFormat::Yaml => serde_yaml_ng::from_str(content)
                .map_err(|e| OcrSheetError::validation(format!("Invalid YAML in {}: {}", path.display(), e))),
        }
    }

    fn render(&self, value: &Value) -> Result<String> {
        match self {
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(value)? + "\n"),
            ConfigFormat::Toml => toml::to_string_pretty(value)
                .map_err(|e| OcrSheetError::serialization_with_source("Failed to serialize TOML", e)),
            ConfigFormat::Yaml => serde_yaml_ng::to_string(value)
                .map_err(|e| OcrSheetError::serialization_with_source("Failed to serialize YAML", e)),
        }
    }
}

/// Recursively overlay `overlay` onto `base`. Objects merge key by key;
/// any other value replaces what was there.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Build a nested object from a dotted key, e.g. `ocr.psm` -> `{"ocr": {"psm": value}}`.
pub fn dotted_value(key: &str, value: Value) -> Result<Value> {
    let parts = split_key(key)?;
    Ok(parts
        .iter()
        .rev()
        .fold(value, |inner, part| {
            let mut map = Map::new();
            map.insert((*part).to_string(), inner);
            Value::Object(map)
        }))
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(OcrSheetError::validation(format!("Invalid configuration key '{}'", key)));
    }
    Ok(parts)
}

/// Settings file bound to its location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    format: ConfigFormat,
    value: Value,
    config: AppConfig,
}

impl ConfigStore {
    /// `<config_dir>/ocrsheet/settings.json`, or `config/settings.json`
    /// relative to the working directory when the platform has no config
    /// directory.
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            None => PathBuf::from("config").join(CONFIG_FILE_NAME),
        }
    }

    /// Load the settings file at `path`.
    ///
    /// A missing file is created with the defaults. Keys absent from an
    /// existing file are backfilled from the defaults in memory; unknown
    /// keys are preserved.
    ///
    /// # Errors
    ///
    /// Returns `OcrSheetError::Validation` if the file cannot be read or
    /// does not hold a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = ConfigFormat::from_path(&path);
        let mut value = AppConfig::defaults_value()?;

        if !path.exists() {
            tracing::info!("Creating default configuration at {}", path.display());
            let store = Self {
                config: AppConfig::from_value(&value)?,
                path,
                format,
                value,
            };
            store.save()?;
            return Ok(store);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            OcrSheetError::validation(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let file_value = format.parse(&content, &path)?;
        if !file_value.is_object() {
            return Err(OcrSheetError::validation(format!(
                "Config file {} must contain a table of sections",
                path.display()
            )));
        }

        merge_values(&mut value, file_value);
        let config = AppConfig::from_value(&value)?;
        tracing::debug!("Loaded configuration from {}", path.display());

        Ok(Self {
            path,
            format,
            value,
            config,
        })
    }

    /// Load from `path`, or from [`ConfigStore::default_path`] when `None`.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(Self::default_path()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Full merged value tree, including unknown keys.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Look up a dotted key such as `ocr.psm`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let parts = split_key(key).ok()?;
        parts.iter().try_fold(&self.value, |node, part| node.get(*part))
    }

    /// Set a dotted key and write the file back.
    ///
    /// The change is validated against the typed configuration first; an
    /// invalid value leaves both memory and file untouched.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let overlay = dotted_value(key, value)?;
        let mut candidate = self.value.clone();
        merge_values(&mut candidate, overlay);

        let config = AppConfig::from_value(&candidate)?;
        self.value = candidate;
        self.config = config;
        self.save()?;
        tracing::debug!(key, "Configuration updated");
        Ok(())
    }

    /// Set a dotted key from command-line text: valid JSON (`true`, `2.5`,
    /// `"x"`) is taken as typed, anything else as a string.
    pub fn set_from_str(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.set(key, value)
    }

    /// Record the folder of a loaded input as `paths.last_folder`.
    pub fn remember_last_folder(&mut self, input: &Path) -> Result<()> {
        let Some(folder) = input.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        let folder = std::fs::canonicalize(folder).unwrap_or_else(|_| folder.to_path_buf());
        self.set("paths.last_folder", Value::String(folder.display().to_string()))
    }

    /// Configuration with `overrides` layered on top, without persisting.
    pub fn with_overrides(&self, overrides: Value) -> Result<AppConfig> {
        let mut merged = self.value.clone();
        merge_values(&mut merged, overrides);
        AppConfig::from_value(&merged)
    }

    /// Write the current value tree to disk, creating parent directories.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = self.format.render(&self.value)?;
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}
