//! Input loading.
//!
//! Images are decoded with the `image` crate. PDFs are rendered page by page
//! (feature `pdf`) and stitched vertically into one image.
use crate::pdf::PdfRenderOptions;
use crate::{OcrSheetError, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// What an input file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Pdf,
}

/// A loaded source image. Immutable; replaced wholesale on the next load.
#[derive(Debug, Clone)]
pub struct RawImage {
    path: PathBuf,
    image: Arc<DynamicImage>,
}

impl RawImage {
    pub fn new(path: impl Into<PathBuf>, image: DynamicImage) -> Self {
        Self {
            path: path.into(),
            image: Arc::new(image),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Shared handle to the pixels, for handing to a worker thread.
    pub fn shared(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.image)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Read a file, reporting a missing file as a load failure.
///
/// # Errors
///
/// Returns `OcrSheetError::Load` when the file does not exist and
/// `OcrSheetError::Io` for other I/O errors (these always bubble up).
pub fn read_input(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(OcrSheetError::load(format!("File not found: {}", path.display())));
    }
    Ok(std::fs::read(path)?)
}

/// Classify input by content, falling back to the file extension.
pub fn detect_input_kind(path: &Path, bytes: &[u8]) -> Result<InputKind> {
    if let Some(kind) = infer::get(bytes) {
        let mime = kind.mime_type();
        if mime == PDF_MIME_TYPE {
            return Ok(InputKind::Pdf);
        }
        if mime.starts_with("image/") {
            return Ok(InputKind::Image);
        }
        return Err(OcrSheetError::load(format!(
            "Unsupported input type {} for {}",
            mime,
            path.display()
        )));
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        return Ok(InputKind::Pdf);
    }
    if image::ImageFormat::from_path(path).is_ok() {
        return Ok(InputKind::Image);
    }

    Err(OcrSheetError::load(format!(
        "Cannot determine the type of {}",
        path.display()
    )))
}

/// Decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<RawImage> {
    let path = path.as_ref();
    let bytes = read_input(path)?;
    decode_image(path, &bytes)
}

fn decode_image(path: &Path, bytes: &[u8]) -> Result<RawImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| OcrSheetError::load_with_source(format!("Failed to decode image {}", path.display()), e))?;
    tracing::info!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(RawImage::new(path, image))
}

/// Load an image or a PDF. PDF pages in the requested range are stitched
/// top to bottom into a single image.
pub fn load_input(path: impl AsRef<Path>, pdf_options: &PdfRenderOptions) -> Result<RawImage> {
    let path = path.as_ref();
    let bytes = read_input(path)?;
    match detect_input_kind(path, &bytes)? {
        InputKind::Image => decode_image(path, &bytes),
        InputKind::Pdf => load_pdf(path, &bytes, pdf_options),
    }
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path, bytes: &[u8], options: &PdfRenderOptions) -> Result<RawImage> {
    use crate::pdf::{StitchDirection, render_pdf_bytes, stitch_pages};

    let pages = render_pdf_bytes(bytes, options)?;
    let image = stitch_pages(&pages, StitchDirection::Vertical)?;
    tracing::info!(
        "Loaded {} ({} pages, {}x{})",
        path.display(),
        pages.len(),
        image.width(),
        image.height()
    );
    Ok(RawImage::new(path, image))
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(path: &Path, _bytes: &[u8], _options: &PdfRenderOptions) -> Result<RawImage> {
    Err(OcrSheetError::MissingDependency(format!(
        "PDF input requires the `pdf` feature: {}",
        path.display()
    )))
}
