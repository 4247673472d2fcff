//! Core orchestration module.
//!
//! # Architecture
//!
//! - **Configuration**: layered settings file and per-job snapshots
//! - **I/O**: loading images and PDFs into a [`RawImage`]
//! - **Orchestrator**: the preprocess, recognize, infer job on a worker thread
//!
//! # Example
//!
//! ```rust,no_run
//! use ocrsheet::core::config::ConfigStore;
//! use ocrsheet::core::io::load_image;
//! use ocrsheet::core::orchestrator::{JobEvent, Orchestrator};
//! # use ocrsheet::ocr::{RecognitionParams, TextRecognizer};
//! # use std::sync::Arc;
//! # struct Engine;
//! # impl TextRecognizer for Engine {
//! #     fn name(&self) -> &str { "engine" }
//! #     fn recognize(&self, _: &image::GrayImage, _: &RecognitionParams) -> ocrsheet::Result<String> {
//! #         Ok(String::new())
//! #     }
//! # }
//!
//! # async fn example() -> ocrsheet::Result<()> {
//! let store = ConfigStore::load("settings.json")?;
//! let image = load_image("scan.png")?;
//!
//! let (orchestrator, mut events) = Orchestrator::new(Arc::new(Engine));
//! orchestrator.submit(&image, store.config().job_config());
//!
//! while let Some(event) = events.recv().await {
//!     if let JobEvent::Completed(output) = event {
//!         println!("{}", output.table.to_markdown());
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod io;
pub mod orchestrator;

pub use config::{AppConfig, ConfigStore, JobConfig};
pub use io::{InputKind, RawImage, load_image, load_input};
pub use orchestrator::{JobEvent, JobId, JobOutput, JobPhase, Orchestrator, ProgressUpdate, execute_job};
