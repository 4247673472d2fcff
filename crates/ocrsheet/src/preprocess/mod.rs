//! Image preprocessing for OCR.
//!
//! Turns a loaded image into a single-channel, binarized bitmap that the
//! recognizer can read reliably. The pipeline is a fixed sequence of steps,
//! each individually toggleable through [`PreprocessConfig`]:
//!
//! 1. Grayscale conversion
//! 2. Median denoise (3x3)
//! 3. Contrast/brightness remap
//! 4. Thresholding (adaptive, Otsu or fixed)
//! 5. Deskew
//!
//! The pipeline never fails outright. If any step errors, the result is a
//! plain grayscale conversion of the original image and
//! [`Preprocessed::fallback`] carries the reason, so the caller can log the
//! degradation instead of losing it.
//!
//! # Example
//!
//! ```rust
//! use image::{DynamicImage, RgbImage};
//! use ocrsheet::preprocess::{PreprocessConfig, preprocess};
//!
//! let image = DynamicImage::ImageRgb8(RgbImage::new(64, 32));
//! let processed = preprocess(&image, &PreprocessConfig::default());
//!
//! assert!(processed.fallback.is_none());
//! assert_eq!(processed.image.dimensions(), (64, 32));
//! ```
pub mod adjust;
pub mod deskew;
pub mod luma;
pub mod threshold;

pub use adjust::{adjust_contrast_brightness, brightness_offset, denoise};
pub use deskew::{DESKEW_MIN_ANGLE, DESKEW_MIN_PIXELS, deskew, estimate_skew_angle, normalize_angle, rotate_about_center};
pub use luma::{fallback_grayscale, luma_bt601, to_luma_bt601};
pub use threshold::{ThresholdMethod, adaptive_threshold_gaussian, binarize};

use crate::{OcrSheetError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Preprocessing options, one immutable snapshot per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Reduce to a single intensity channel before denoising.
    pub grayscale: bool,

    /// Apply a 3x3 median filter.
    pub denoise: bool,

    /// Multiplicative gain (typical 0.5-3.0).
    pub contrast: f32,

    /// Brightness factor (typical 0.0-2.0, 1.0 = unchanged).
    pub brightness: f32,

    /// Binarization method.
    pub threshold: ThresholdMethod,

    /// Correct the dominant text rotation.
    pub deskew: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            denoise: true,
            contrast: 1.5,
            brightness: 1.0,
            threshold: ThresholdMethod::Adaptive,
            deskew: true,
        }
    }
}

/// Output of [`preprocess`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// OCR-ready bitmap.
    pub image: GrayImage,

    /// Rotation applied by the deskew step, in degrees.
    pub skew_angle: Option<f64>,

    /// Why the pipeline fell back to plain grayscale, if it did.
    pub fallback: Option<String>,
}

impl Preprocessed {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Image under transformation before binarization.
enum Working {
    Luma(GrayImage),
    Rgb(RgbImage),
}

impl Working {
    fn into_luma(self) -> GrayImage {
        match self {
            Working::Luma(gray) => gray,
            Working::Rgb(rgb) => luma_bt601(&rgb),
        }
    }
}

/// Run the preprocessing pipeline.
///
/// Deterministic for identical inputs; the deskew angle depends only on
/// pixel content.
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> Preprocessed {
    match run_pipeline(image, config) {
        Ok((processed, skew_angle)) => Preprocessed {
            image: processed,
            skew_angle,
            fallback: None,
        },
        Err(err) => {
            tracing::warn!("Preprocessing failed, using plain grayscale: {}", err);
            Preprocessed {
                image: fallback_grayscale(image),
                skew_angle: None,
                fallback: Some(err.to_string()),
            }
        }
    }
}

fn run_pipeline(image: &DynamicImage, config: &PreprocessConfig) -> Result<(GrayImage, Option<f64>)> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(OcrSheetError::image_processing(format!(
            "Image has no pixels ({}x{})",
            width, height
        )));
    }
    if !config.contrast.is_finite() || !config.brightness.is_finite() {
        return Err(OcrSheetError::image_processing(format!(
            "Contrast and brightness must be finite (contrast={}, brightness={})",
            config.contrast, config.brightness
        )));
    }

    let mut working = if config.grayscale {
        Working::Luma(to_luma_bt601(image))
    } else {
        Working::Rgb(image.to_rgb8())
    };

    if config.denoise {
        working = match working {
            Working::Luma(gray) => Working::Luma(denoise(&gray)),
            Working::Rgb(rgb) => Working::Rgb(denoise(&rgb)),
        };
    }

    match &mut working {
        Working::Luma(gray) => adjust_contrast_brightness(gray, config.contrast, config.brightness),
        Working::Rgb(rgb) => adjust_contrast_brightness(rgb, config.contrast, config.brightness),
    }

    let gray = working.into_luma();
    let binary = binarize(&gray, config.threshold)?;
    tracing::debug!(method = ?config.threshold, width, height, "Thresholding complete");

    if config.deskew {
        Ok(deskew(binary))
    } else {
        Ok((binary, None))
    }
}

/// Downsize an image to fit within `max_width` x `max_height`, keeping the
/// aspect ratio. Images already within bounds are returned unchanged.
pub fn resize_to_fit(image: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= max_width && height <= max_height {
        return image.clone();
    }

    let ratio = f64::min(max_width as f64 / width as f64, max_height as f64 / height as f64);
    let new_width = ((width as f64 * ratio) as u32).max(1);
    let new_height = ((height as f64 * ratio) as u32).max(1);
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}
