//! Text recognition boundary.
//!
//! The pipeline talks to OCR engines only through [`TextRecognizer`]. The
//! Tesseract implementation is compiled in with the `ocr` feature; without
//! it, callers supply their own recognizer.
mod recognizer;
pub mod tessdata;
mod types;

#[cfg(feature = "ocr")]
mod tesseract;

pub use recognizer::{TextRecognizer, strip_control_characters};
pub use tessdata::{resolve_tessdata_dir, validate_language};
pub use types::{RecognitionParams, RecognitionResult};

#[cfg(feature = "ocr")]
pub use tesseract::TesseractRecognizer;
