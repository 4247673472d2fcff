use super::types::RecognitionParams;
use crate::Result;
use image::GrayImage;
use std::sync::Arc;

/// Boundary to an external OCR engine.
///
/// Implementations run on a blocking worker thread and may take seconds.
/// Engine unavailability or misconfiguration is reported as
/// [`OcrSheetError::Ocr`](crate::OcrSheetError::Ocr).
pub trait TextRecognizer: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Recognize the text in a preprocessed bitmap.
    fn recognize(&self, image: &GrayImage, params: &RecognitionParams) -> Result<String>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &GrayImage, params: &RecognitionParams) -> Result<String> {
        (**self).recognize(image, params)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &GrayImage, params: &RecognitionParams) -> Result<String> {
        (**self).recognize(image, params)
    }
}

/// Remove control characters other than `\n`, `\r` and `\t` from engine
/// output.
pub fn strip_control_characters(text: &str) -> String {
    if text
        .chars()
        .any(|c| matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}') && !matches!(c, '\n' | '\r' | '\t'))
    {
        text.chars()
            .filter(|c| !matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}') || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    } else {
        text.to_string()
    }
}
