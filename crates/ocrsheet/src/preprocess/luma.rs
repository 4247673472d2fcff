//! BT.601 luma conversion.
//!
//! `image`'s own `to_luma8` uses Rec.709 weights. OCR thresholds are tuned
//! for BT.601 (0.299 R + 0.587 G + 0.114 B), so grayscale conversion in the
//! pipeline goes through here instead.
use image::{DynamicImage, GrayImage, Luma, RgbImage};

const SHIFT_14: u32 = 14;
const WEIGHTS_14: [u32; 3] = [4899, 9617, 1868];

const SHIFT_16: u32 = 16;
const WEIGHTS_16: [u32; 3] = [19595, 38470, 7471];

fn weighted(rgb: &RgbImage, weights: [u32; 3], shift: u32) -> GrayImage {
    let half = 1u32 << (shift - 1);
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let sum = r as u32 * weights[0] + g as u32 * weights[1] + b as u32 * weights[2] + half;
        Luma([(sum >> shift) as u8])
    })
}

/// BT.601 luma in 14-bit fixed point with round-half-up, the pipeline's
/// grayscale step.
pub fn luma_bt601(rgb: &RgbImage) -> GrayImage {
    weighted(rgb, WEIGHTS_14, SHIFT_14)
}

/// [`luma_bt601`] for any image. Single-channel 8-bit input is returned
/// as is.
pub fn to_luma_bt601(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => luma_bt601(&other.to_rgb8()),
    }
}

/// BT.601 luma in 16-bit fixed point, used for the plain-grayscale
/// fallback.
pub fn fallback_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => weighted(&other.to_rgb8(), WEIGHTS_16, SHIFT_16),
    }
}
