//! Shared fixtures for integration tests.
#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use ocrsheet::ocr::{RecognitionParams, TextRecognizer};
use ocrsheet::{OcrSheetError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Recognizer that returns canned text and records what it was given.
pub struct ScriptedRecognizer {
    text: String,
    pub calls: AtomicUsize,
    pub last_params: Mutex<Option<RecognitionParams>>,
    pub last_dimensions: Mutex<Option<(u32, u32)>>,
}

impl ScriptedRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
            last_params: Mutex::new(None),
            last_dimensions: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, image: &GrayImage, params: &RecognitionParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock() = Some(params.clone());
        *self.last_dimensions.lock() = Some(image.dimensions());
        Ok(self.text.clone())
    }
}

/// Recognizer that always fails with the given message.
pub struct FailingRecognizer(pub &'static str);

impl TextRecognizer for FailingRecognizer {
    fn name(&self) -> &str {
        "failing"
    }

    fn recognize(&self, _image: &GrayImage, _params: &RecognitionParams) -> Result<String> {
        Err(OcrSheetError::ocr(self.0))
    }
}

/// Recognizer that blocks until released, for exercising the busy state.
pub struct GatedRecognizer {
    gate: Mutex<mpsc::Receiver<()>>,
    text: String,
}

impl GatedRecognizer {
    pub fn new(text: impl Into<String>) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                gate: Mutex::new(rx),
                text: text.into(),
            },
            tx,
        )
    }
}

impl TextRecognizer for GatedRecognizer {
    fn name(&self) -> &str {
        "gated"
    }

    fn recognize(&self, _image: &GrayImage, _params: &RecognitionParams) -> Result<String> {
        self.gate
            .lock()
            .recv()
            .map_err(|_| OcrSheetError::ocr("gate closed"))?;
        Ok(self.text.clone())
    }
}

/// Light page with dark horizontal strokes, roughly like lines of text.
pub fn document_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([240, 238, 235]));
    for y in (10..height.saturating_sub(10)).step_by(14) {
        for x in 8..width.saturating_sub(8) {
            if (x / 6) % 4 != 3 {
                for dy in 0..3 {
                    img.put_pixel(x, y + dy, Rgb([25, 25, 30]));
                }
            }
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Noisy grayscale gradient.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = GrayImage::from_fn(width, height, |x, y| {
        let base = (x * 255 / width.max(1)) as u8;
        let noise = ((x * 31 + y * 17) % 23) as u8;
        Luma([base.saturating_add(noise)])
    });
    DynamicImage::ImageLuma8(img)
}
