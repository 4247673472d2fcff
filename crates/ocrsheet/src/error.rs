//! Error types for ocrsheet.
//!
//! Every fallible operation in the library returns [`OcrSheetError`]. The
//! variants follow the failure taxonomy of the OCR pipeline:
//!
//! - `Io` - File system errors; these always bubble up unchanged
//! - `Load` - The input image or PDF could not be read or decoded; no job starts
//! - `ImageProcessing` - A preprocessing step failed; absorbed by the grayscale fallback
//! - `Ocr` - The recognizer is unavailable, misconfigured or failed; the job aborts
//! - `Export` - The export target could not be written; the table is unaffected
//! - `Validation` - Invalid configuration keys/values, cell indices, empty exports
//!
//! # Example
//!
//! ```rust
//! use ocrsheet::{OcrSheetError, Result};
//!
//! fn read_text(path: &str) -> Result<String> {
//!     // IO errors bubble up automatically via ?
//!     let content = std::fs::read_to_string(path)?;
//!
//!     if content.trim().is_empty() {
//!         return Err(OcrSheetError::validation(format!("File is empty: {}", path)));
//!     }
//!
//!     Ok(content)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `OcrSheetError`.
pub type Result<T> = std::result::Result<T, OcrSheetError>;

/// Main error type for all ocrsheet operations.
#[derive(Debug, Error)]
pub enum OcrSheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {message}")]
    Load {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Export error: {message}")]
    Export {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),
}

impl From<serde_json::Error> for OcrSheetError {
    fn from(err: serde_json::Error) -> Self {
        OcrSheetError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for OcrSheetError {
    fn from(err: image::ImageError) -> Self {
        OcrSheetError::ImageProcessing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl OcrSheetError {
    error_constructor!(load, Load);
    error_constructor!(image_processing, ImageProcessing);
    error_constructor!(ocr, Ocr);
    error_constructor!(export, Export);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// Message suitable for showing to the user verbatim.
    ///
    /// Recognition failures are surfaced without the variant prefix so the
    /// engine's own wording reaches the user unchanged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Ocr { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
