//! Binarization.
//!
//! All methods map a pixel to 255 when it is strictly brighter than its
//! level and to 0 otherwise. Only the way the level is chosen differs.
use crate::{OcrSheetError, Result};
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Neighbourhood size of the adaptive method.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the adaptive local mean.
pub const ADAPTIVE_OFFSET: i32 = 2;

/// Level used by [`ThresholdMethod::Fixed`].
pub const FIXED_LEVEL: u8 = 150;

/// How the binarization level is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    /// Gaussian-weighted local mean over an 11x11 window, minus 2.
    #[default]
    Adaptive,
    /// Single global level maximizing inter-class variance.
    Otsu,
    /// Global level of 150.
    Fixed,
}

impl ThresholdMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdMethod::Adaptive => "adaptive",
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::Fixed => "fixed",
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdMethod {
    type Err = OcrSheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(ThresholdMethod::Adaptive),
            "otsu" => Ok(ThresholdMethod::Otsu),
            "fixed" => Ok(ThresholdMethod::Fixed),
            other => Err(OcrSheetError::validation(format!(
                "Unknown threshold method '{}' (expected adaptive, otsu or fixed)",
                other
            ))),
        }
    }
}

/// Binarize a grayscale image with the given method.
pub fn binarize(image: &GrayImage, method: ThresholdMethod) -> Result<GrayImage> {
    match method {
        ThresholdMethod::Adaptive => adaptive_threshold_gaussian(image, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET),
        ThresholdMethod::Otsu => Ok(threshold_above(image, otsu_level(image))),
        ThresholdMethod::Fixed => Ok(threshold_above(image, FIXED_LEVEL)),
    }
}

fn threshold_above(image: &GrayImage, level: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > level { 255 } else { 0 };
    }
    out
}

/// Sigma a Gaussian kernel of `size` taps gets when none is given.
fn default_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = default_sigma(size);
    let center = (size / 2) as f32;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Local-mean threshold with Gaussian weights.
///
/// The weighted mean is computed with a separable kernel over a
/// `block_size` x `block_size` window, replicating edge pixels outside the
/// image. A pixel becomes 255 when it is greater than `mean - offset`.
pub fn adaptive_threshold_gaussian(image: &GrayImage, block_size: u32, offset: i32) -> Result<GrayImage> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(OcrSheetError::validation(format!(
            "Adaptive threshold block size must be odd and at least 3, got {}",
            block_size
        )));
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }

    let kernel = gaussian_kernel(block_size);
    let radius = (block_size / 2) as i64;
    let clamp_x = |x: i64| x.clamp(0, width as i64 - 1) as u32;
    let clamp_y = |y: i64| y.clamp(0, height as i64 - 1) as u32;

    let mut horizontal = vec![0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp_x(x as i64 + k as i64 - radius);
                acc += weight * image.get_pixel(sx, y)[0] as f32;
            }
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp_y(y as i64 + k as i64 - radius);
                acc += weight * horizontal[(sy * width + x) as usize];
            }
            let mean = acc.round().clamp(0.0, 255.0) as i32;
            let value = image.get_pixel(x, y)[0] as i32;
            out.put_pixel(x, y, Luma([if value > mean - offset { 255 } else { 0 }]));
        }
    }

    Ok(out)
}
