//! Job orchestration.
//!
//! A job runs preprocessing, recognition and table inference in order on a
//! blocking worker thread (`tokio::task::spawn_blocking`). Progress and the
//! outcome travel back over an unbounded channel as [`JobEvent`]s; the
//! consumer owns the result store and applies them.
//!
//! Only one job runs at a time. [`Orchestrator::submit`] returns `None`
//! while a job is in flight.
//!
//! ```text
//! Idle -> Preprocessing -> Recognizing -> Inferring -> Done
//!              \________________\______________\_____> Failed
//! ```
use crate::core::config::JobConfig;
use crate::core::io::RawImage;
use crate::ocr::{RecognitionResult, TextRecognizer, strip_control_characters};
use crate::preprocess::preprocess;
use crate::table::{Table, infer_table};
use crate::{OcrSheetError, Result};
use image::DynamicImage;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Identifier assigned to each accepted job, increasing from 1.
pub type JobId = u64;

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Idle,
    Preprocessing,
    Recognizing,
    Inferring,
    Done,
    Failed,
}

impl JobPhase {
    /// Whether a job is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            JobPhase::Preprocessing | JobPhase::Recognizing | JobPhase::Inferring
        )
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Preprocessing => "preprocessing",
            JobPhase::Recognizing => "recognizing",
            JobPhase::Inferring => "inferring",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One progress step of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    pub phase: JobPhase,
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    fn new(job_id: JobId, phase: JobPhase, percent: u8, message: impl Into<String>) -> Self {
        Self {
            job_id,
            phase,
            percent,
            message: message.into(),
        }
    }
}

/// Everything a successful job produces.
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub job_id: JobId,
    pub recognition: RecognitionResult,
    pub table: Table,
    /// Reason preprocessing degraded to plain grayscale, if it did.
    pub preprocess_fallback: Option<String>,
    /// Rotation applied by deskew, in degrees.
    pub skew_angle: Option<f64>,
}

/// Message from a worker to the consumer.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Progress(ProgressUpdate),
    Completed(JobOutput),
    Failed { job_id: JobId, message: String },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Progress(update) => update.job_id,
            JobEvent::Completed(output) => output.job_id,
            JobEvent::Failed { job_id, .. } => *job_id,
        }
    }

    /// Whether this is the last event of its job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed(_) | JobEvent::Failed { .. })
    }
}

/// Run one job synchronously, reporting each phase through `on_progress`.
///
/// Preprocessing never fails (it degrades to grayscale); recognition errors
/// abort the job. The final `Done` step is left to the caller.
pub fn execute_job(
    job_id: JobId,
    image: &DynamicImage,
    config: &JobConfig,
    recognizer: &dyn TextRecognizer,
    mut on_progress: impl FnMut(ProgressUpdate),
) -> Result<JobOutput> {
    on_progress(ProgressUpdate::new(
        job_id,
        JobPhase::Preprocessing,
        10,
        "Preprocessing image",
    ));
    let processed = preprocess(image, &config.preprocess);
    if let Some(reason) = &processed.fallback {
        tracing::warn!(job_id, "Using grayscale fallback: {}", reason);
    }

    let params = &config.recognition;
    on_progress(ProgressUpdate::new(
        job_id,
        JobPhase::Recognizing,
        30,
        format!(
            "Configuring {} (language={}, psm={}, oem={})",
            recognizer.name(),
            params.language,
            params.psm,
            params.oem
        ),
    ));
    on_progress(ProgressUpdate::new(job_id, JobPhase::Recognizing, 50, "Recognizing text"));
    let raw_text = recognizer.recognize(&processed.image, params)?;
    let text = strip_control_characters(&raw_text);

    on_progress(ProgressUpdate::new(job_id, JobPhase::Inferring, 80, "Building table"));
    let table = infer_table(&text);

    Ok(JobOutput {
        job_id,
        recognition: RecognitionResult {
            text,
            language: params.language.clone(),
        },
        table,
        preprocess_fallback: processed.fallback,
        skew_angle: processed.skew_angle,
    })
}

#[derive(Debug)]
struct JobStatus {
    phase: JobPhase,
    current: Option<JobId>,
    last_id: JobId,
}

/// Runs jobs one at a time on the blocking pool.
pub struct Orchestrator {
    recognizer: Arc<dyn TextRecognizer>,
    status: Arc<Mutex<JobStatus>>,
    events: UnboundedSender<JobEvent>,
}

impl Orchestrator {
    /// Create an orchestrator and the receiving end of its event channel.
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> (Self, UnboundedReceiver<JobEvent>) {
        let (events, receiver) = unbounded_channel();
        let orchestrator = Self {
            recognizer,
            status: Arc::new(Mutex::new(JobStatus {
                phase: JobPhase::Idle,
                current: None,
                last_id: 0,
            })),
            events,
        };
        (orchestrator, receiver)
    }

    pub fn phase(&self) -> JobPhase {
        self.status.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// Job currently or most recently run.
    pub fn current_job(&self) -> Option<JobId> {
        self.status.lock().current
    }

    /// Start a job on `image` with a configuration snapshot.
    ///
    /// Returns the new job id, or `None` without side effects when a job is
    /// already running. Must be called from within a Tokio runtime.
    pub fn submit(&self, image: &RawImage, config: JobConfig) -> Option<JobId> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Cannot start OCR job outside a Tokio runtime: {}", e);
                return None;
            }
        };

        let job_id = {
            let mut status = self.status.lock();
            if status.phase.is_busy() {
                tracing::debug!(
                    running = ?status.current,
                    "Rejected job submission while {} is in progress",
                    status.phase
                );
                return None;
            }
            status.last_id += 1;
            status.current = Some(status.last_id);
            status.phase = JobPhase::Preprocessing;
            status.last_id
        };

        tracing::info!(job_id, "Starting OCR job for {}", image.path().display());

        let worker = JobWorker {
            job_id,
            status: Arc::clone(&self.status),
            events: self.events.clone(),
        };
        let pixels = image.shared();
        let recognizer = Arc::clone(&self.recognizer);

        runtime.spawn_blocking(move || worker.run(&pixels, &config, recognizer.as_ref()));
        Some(job_id)
    }
}

/// Worker-side half of a job: updates shared state, then emits the event.
struct JobWorker {
    job_id: JobId,
    status: Arc<Mutex<JobStatus>>,
    events: UnboundedSender<JobEvent>,
}

impl JobWorker {
    fn run(self, image: &DynamicImage, config: &JobConfig, recognizer: &dyn TextRecognizer) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute_job(self.job_id, image, config, recognizer, |update| self.progress(update))
        }))
        .unwrap_or_else(|_| Err(OcrSheetError::ocr("Recognition worker panicked")));

        match outcome {
            Ok(output) => {
                self.progress(ProgressUpdate::new(self.job_id, JobPhase::Done, 100, "Done"));
                tracing::info!(
                    job_id = self.job_id,
                    rows = output.table.row_count(),
                    columns = output.table.column_count(),
                    "OCR job completed"
                );
                self.send(JobEvent::Completed(output));
            }
            Err(err) => {
                self.status.lock().phase = JobPhase::Failed;
                tracing::warn!(job_id = self.job_id, "OCR job failed: {}", err);
                self.send(JobEvent::Failed {
                    job_id: self.job_id,
                    message: err.user_message(),
                });
            }
        }
    }

    fn progress(&self, update: ProgressUpdate) {
        self.status.lock().phase = update.phase;
        tracing::debug!(job_id = self.job_id, percent = update.percent, "{}", update.message);
        self.send(JobEvent::Progress(update));
    }

    fn send(&self, event: JobEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(job_id = self.job_id, "Event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::RecognitionParams;
    use image::GrayImage;

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _image: &GrayImage, _params: &RecognitionParams) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    impl TextRecognizer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn recognize(&self, _image: &GrayImage, _params: &RecognitionParams) -> Result<String> {
            Err(OcrSheetError::ocr("Failed to initialize language 'xx'"))
        }
    }

    #[test]
    fn test_phase_busy() {
        assert!(!JobPhase::Idle.is_busy());
        assert!(JobPhase::Preprocessing.is_busy());
        assert!(JobPhase::Recognizing.is_busy());
        assert!(JobPhase::Inferring.is_busy());
        assert!(!JobPhase::Done.is_busy());
        assert!(!JobPhase::Failed.is_busy());
    }

    #[test]
    fn test_execute_job_progress_sequence() {
        let image = DynamicImage::new_luma8(16, 16);
        let mut updates = Vec::new();
        let output = execute_job(
            7,
            &image,
            &JobConfig::default(),
            &FixedText("a,b\n1,2\u{0007}"),
            |u| updates.push(u),
        )
        .unwrap();

        let steps: Vec<(JobPhase, u8)> = updates.iter().map(|u| (u.phase, u.percent)).collect();
        assert_eq!(
            steps,
            vec![
                (JobPhase::Preprocessing, 10),
                (JobPhase::Recognizing, 30),
                (JobPhase::Recognizing, 50),
                (JobPhase::Inferring, 80),
            ]
        );
        assert!(updates.iter().all(|u| u.job_id == 7));
        assert_eq!(output.recognition.text, "a,b\n1,2");
        assert_eq!(output.recognition.language, "eng");
        assert_eq!(output.table.headers, vec!["a", "b"]);
    }

    #[test]
    fn test_execute_job_recognizer_error() {
        let image = DynamicImage::new_luma8(4, 4);
        let result = execute_job(1, &image, &JobConfig::default(), &Broken, |_| {});
        assert!(matches!(result, Err(OcrSheetError::Ocr { .. })));
    }

    #[test]
    fn test_submit_outside_runtime_is_rejected() {
        let (orchestrator, _rx) = Orchestrator::new(Arc::new(FixedText("x")));
        let raw = RawImage::new("x.png", DynamicImage::new_luma8(4, 4));
        assert_eq!(orchestrator.submit(&raw, JobConfig::default()), None);
        assert_eq!(orchestrator.phase(), JobPhase::Idle);
    }

    #[tokio::test]
    async fn test_failed_job_reports_verbatim_message() {
        let (orchestrator, mut rx) = Orchestrator::new(Arc::new(Broken));
        let raw = RawImage::new("x.png", DynamicImage::new_luma8(4, 4));
        let job_id = orchestrator.submit(&raw, JobConfig::default()).unwrap();

        let mut failure = None;
        while let Some(event) = rx.recv().await {
            if let JobEvent::Failed { job_id: id, message } = event {
                failure = Some((id, message));
                break;
            }
        }

        let (id, message) = failure.unwrap();
        assert_eq!(id, job_id);
        assert_eq!(message, "Failed to initialize language 'xx'");
        assert_eq!(orchestrator.phase(), JobPhase::Failed);
    }
}
