use super::recognizer::TextRecognizer;
use super::tessdata::{resolve_tessdata_dir, validate_language};
use super::types::RecognitionParams;
use crate::{OcrSheetError, Result};
use image::GrayImage;
use kreuzberg_tesseract::TesseractAPI;
use std::path::PathBuf;

/// [`TextRecognizer`] backed by the Tesseract engine.
///
/// A fresh engine handle is created per call; jobs never overlap, so there
/// is nothing to share between them.
#[derive(Debug, Clone, Default)]
pub struct TesseractRecognizer {
    tessdata_dir: Option<PathBuf>,
}

impl TesseractRecognizer {
    /// Create a recognizer, resolving the tessdata directory from the
    /// configured path, `TESSDATA_PREFIX` or well-known install locations.
    pub fn new(configured_tessdata: Option<PathBuf>) -> Self {
        let tessdata_dir = resolve_tessdata_dir(configured_tessdata.as_deref());
        tracing::debug!(tessdata = ?tessdata_dir, "Resolved tessdata directory");
        Self { tessdata_dir }
    }

    pub fn tessdata_dir(&self) -> Option<&std::path::Path> {
        self.tessdata_dir.as_deref()
    }

    /// Linked Tesseract version.
    pub fn version() -> String {
        TesseractAPI::version()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, params: &RecognitionParams) -> Result<String> {
        validate_language(&params.language, self.tessdata_dir.as_deref())?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrSheetError::ocr("Cannot recognize an empty image"));
        }

        let datapath = self
            .tessdata_dir
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        let api = TesseractAPI::new();
        api.init(&datapath, &params.language).map_err(|e| {
            OcrSheetError::ocr(format!(
                "Failed to initialize language '{}': {}",
                params.language, e
            ))
        })?;

        api.set_variable("tessedit_ocr_engine_mode", &params.oem.to_string())
            .map_err(|e| OcrSheetError::ocr(format!("Failed to set engine mode {}: {}", params.oem, e)))?;
        api.set_variable("tessedit_pageseg_mode", &params.psm.to_string())
            .map_err(|e| OcrSheetError::ocr(format!("Failed to set page segmentation mode {}: {}", params.psm, e)))?;

        api.set_image(image.as_raw(), width as i32, height as i32, 1, width as i32)
            .map_err(|e| OcrSheetError::ocr(format!("Failed to set image: {}", e)))?;

        api.recognize()
            .map_err(|e| OcrSheetError::ocr(format!("Failed to recognize text: {}", e)))?;

        let text = api
            .get_utf8_text()
            .map_err(|e| OcrSheetError::ocr(format!("Failed to extract text: {}", e)))?;

        tracing::debug!(
            language = %params.language,
            psm = params.psm,
            oem = params.oem,
            chars = text.len(),
            "Tesseract recognition complete"
        );

        Ok(text)
    }
}
