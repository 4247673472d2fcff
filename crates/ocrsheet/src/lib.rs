//! ocrsheet - scanned tables to spreadsheets
//!
//! Loads an image (or a PDF rendered to an image), cleans it up for OCR,
//! hands it to an OCR engine, reshapes the recognized text into rows and
//! columns, and exports the result as an Excel workbook or CSV after any manual cell corrections.
//!
//! # Quick Start
//!
//! ```rust
//! use ocrsheet::table::infer_table;
//!
//! let table = infer_table("Item\tQty\nApples\t3\nPears");
//! assert_eq!(table.headers, vec!["Item", "Qty"]);
//! assert_eq!(table.padded_rows()[1], vec!["Pears", ""]);
//! ```
//!
//! # Architecture
//!
//! - **Preprocessing** (`preprocess`): grayscale, median denoise,
//!   contrast/brightness, thresholding, deskew
//! - **Recognition** (`ocr`): the [`TextRecognizer`](ocr::TextRecognizer)
//!   boundary and the Tesseract implementation (feature `ocr`)
//! - **Table inference** (`table`): delimiter detection and row splitting
//! - **Core** (`core`): configuration, input loading, job orchestration
//! - **Result store** (`workspace`): current table, edits, export
//! - **PDF** (`pdf`): page rendering (feature `pdf`) and stitching
//!
//! # Features
//!
//! - `ocr` - link Tesseract through `kreuzberg-tesseract`
//! - `pdf` - render PDF input through Pdfium
//! - `full` - both

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod export;
pub mod ocr;
pub mod pdf;
pub mod preprocess;
pub mod table;
pub mod workspace;

pub use error::{OcrSheetError, Result};

pub use core::config::{AppConfig, ConfigStore, JobConfig};
pub use core::io::{RawImage, load_image, load_input};
pub use core::orchestrator::{JobEvent, JobId, JobOutput, JobPhase, Orchestrator, ProgressUpdate};
pub use export::{ExportFormat, export_csv, export_table, export_xlsx, save_text};
pub use ocr::{RecognitionParams, RecognitionResult, TextRecognizer};
pub use preprocess::{PreprocessConfig, Preprocessed, ThresholdMethod, preprocess};
pub use table::{Delimiter, Table, infer_table};
pub use workspace::{Applied, Workspace};

#[cfg(feature = "ocr")]
pub use ocr::TesseractRecognizer;
