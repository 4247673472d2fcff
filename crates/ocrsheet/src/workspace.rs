//! Result store.
//!
//! [`Workspace`] lives on the consuming side of the job channel. It owns the
//! loaded image, the current table and the recognized text, applies job
//! events, and is the only place cells are edited.
use crate::core::config::JobConfig;
use crate::core::io::{RawImage, load_input};
use crate::core::orchestrator::{JobEvent, JobId, Orchestrator, ProgressUpdate};
use crate::export::{export_csv, export_table, export_xlsx, save_text};
use crate::pdf::PdfRenderOptions;
use crate::table::Table;
use crate::{OcrSheetError, Result};
use std::path::Path;

/// What [`Workspace::apply`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// Progress of the awaited job was recorded.
    Progress,
    /// The awaited job finished and its table replaced the previous one.
    Completed,
    /// The awaited job failed; the previous table is kept.
    Failed(String),
    /// The event belonged to some other job.
    Ignored,
}

#[derive(Debug, Default)]
pub struct Workspace {
    image: Option<RawImage>,
    table: Table,
    text: String,
    pending: Option<JobId>,
    progress: Option<ProgressUpdate>,
    last_error: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an image or PDF, replacing any previous image. The table is kept
    /// until the next successful job.
    pub fn load(&mut self, path: impl AsRef<Path>, pdf_options: &PdfRenderOptions) -> Result<&RawImage> {
        let raw = load_input(path, pdf_options)?;
        Ok(self.image.insert(raw))
    }

    pub fn set_image(&mut self, image: RawImage) {
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&RawImage> {
        self.image.as_ref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Text recognized by the last successful job.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pending_job(&self) -> Option<JobId> {
        self.pending
    }

    pub fn last_progress(&self) -> Option<&ProgressUpdate> {
        self.progress.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Submit the loaded image to `orchestrator`.
    ///
    /// Returns `Ok(None)` when the orchestrator is busy.
    ///
    /// # Errors
    ///
    /// `OcrSheetError::Validation` when no image is loaded.
    pub fn process(&mut self, orchestrator: &Orchestrator, config: JobConfig) -> Result<Option<JobId>> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| OcrSheetError::validation("No image loaded"))?;

        let job_id = orchestrator.submit(image, config);
        if let Some(id) = job_id {
            self.await_job(id);
        }
        Ok(job_id)
    }

    /// Mark `job_id` as the job whose events are applied.
    pub fn await_job(&mut self, job_id: JobId) {
        self.pending = Some(job_id);
        self.progress = None;
        self.last_error = None;
    }

    /// Apply one event from the job channel.
    pub fn apply(&mut self, event: JobEvent) -> Applied {
        if self.pending != Some(event.job_id()) {
            tracing::warn!(
                job_id = event.job_id(),
                awaited = ?self.pending,
                "Ignoring event from a stale job"
            );
            return Applied::Ignored;
        }

        match event {
            JobEvent::Progress(update) => {
                self.progress = Some(update);
                Applied::Progress
            }
            JobEvent::Completed(output) => {
                self.table = output.table;
                self.text = output.recognition.text;
                self.pending = None;
                Applied::Completed
            }
            JobEvent::Failed { message, .. } => {
                self.last_error = Some(message.clone());
                self.pending = None;
                Applied::Failed(message)
            }
        }
    }

    /// Overwrite one cell of the current table.
    pub fn edit_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        self.table.set_cell(row, column, value)
    }

    /// Drop the table and recognized text. The image stays loaded.
    pub fn clear(&mut self) {
        self.table.clear();
        self.text.clear();
    }

    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        export_csv(&self.table, path)
    }

    pub fn export_xlsx(&self, path: impl AsRef<Path>) -> Result<()> {
        export_xlsx(&self.table, path)
    }

    /// Export as `.xlsx` or `.csv` depending on the extension of `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        export_table(&self.table, path)
    }

    pub fn save_text(&self, path: impl AsRef<Path>) -> Result<()> {
        save_text(&self.text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::orchestrator::{JobOutput, JobPhase};
    use crate::ocr::RecognitionResult;
    use crate::table::infer_table;

    fn completed(job_id: JobId, text: &str) -> JobEvent {
        JobEvent::Completed(JobOutput {
            job_id,
            recognition: RecognitionResult {
                text: text.to_string(),
                language: "eng".to_string(),
            },
            table: infer_table(text),
            preprocess_fallback: None,
            skew_angle: None,
        })
    }

    #[test]
    fn test_completed_replaces_table() {
        let mut ws = Workspace::new();
        ws.await_job(1);
        assert_eq!(ws.apply(completed(1, "a,b\n1,2")), Applied::Completed);
        assert_eq!(ws.table().headers, vec!["a", "b"]);
        assert_eq!(ws.text(), "a,b\n1,2");
        assert_eq!(ws.pending_job(), None);
    }

    #[test]
    fn test_failure_keeps_previous_table() {
        let mut ws = Workspace::new();
        ws.await_job(1);
        ws.apply(completed(1, "x|y\n1|2"));
        let before = ws.table().clone();

        ws.await_job(2);
        let applied = ws.apply(JobEvent::Failed {
            job_id: 2,
            message: "engine missing".to_string(),
        });
        assert_eq!(applied, Applied::Failed("engine missing".to_string()));
        assert_eq!(ws.table(), &before);
        assert_eq!(ws.last_error(), Some("engine missing"));
    }

    #[test]
    fn test_stale_events_ignored() {
        let mut ws = Workspace::new();
        ws.await_job(3);
        assert_eq!(ws.apply(completed(2, "old")), Applied::Ignored);
        assert!(ws.table().is_empty());

        let progress = JobEvent::Progress(ProgressUpdate {
            job_id: 3,
            phase: JobPhase::Recognizing,
            percent: 50,
            message: "Recognizing text".to_string(),
        });
        assert_eq!(ws.apply(progress), Applied::Progress);
        assert_eq!(ws.last_progress().map(|p| p.percent), Some(50));
    }

    #[test]
    fn test_edit_and_clear() {
        let mut ws = Workspace::new();
        ws.await_job(1);
        ws.apply(completed(1, "a;b\n1;2\n3;4"));

        ws.edit_cell(1, 1, "40").unwrap();
        assert_eq!(ws.table().rows[1], vec!["3", "40"]);
        assert_eq!(ws.table().rows[0], vec!["1", "2"]);
        assert!(ws.edit_cell(2, 0, "x").is_err());

        ws.clear();
        assert!(ws.table().is_empty());
        assert_eq!(ws.text(), "");
    }

    #[test]
    fn test_process_without_image() {
        use crate::ocr::{RecognitionParams, TextRecognizer};
        use std::sync::Arc;

        struct Never;
        impl TextRecognizer for Never {
            fn name(&self) -> &str {
                "never"
            }
            fn recognize(&self, _: &image::GrayImage, _: &RecognitionParams) -> Result<String> {
                unreachable!()
            }
        }

        let (orchestrator, _rx) = Orchestrator::new(Arc::new(Never));
        let mut ws = Workspace::new();
        let err = ws.process(&orchestrator, JobConfig::default()).unwrap_err();
        assert!(matches!(err, OcrSheetError::Validation { .. }));
    }
}
