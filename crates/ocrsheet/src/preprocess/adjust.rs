//! Pixel-level adjustments: median denoise and contrast/brightness remap.
use image::{ImageBuffer, Pixel};
use imageproc::filter::median_filter;

/// Median filter radius; radius 1 is a 3x3 neighbourhood.
const DENOISE_RADIUS: u32 = 1;

/// Remove salt-and-pepper noise with a 3x3 median filter, per channel.
pub fn denoise<P>(image: &ImageBuffer<P, Vec<u8>>) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    median_filter(image, DENOISE_RADIUS, DENOISE_RADIUS)
}

/// Additive term derived from the brightness factor.
///
/// A factor of 1.0 leaves intensities unchanged, 0.0 darkens by 50 and 2.0
/// brightens by 50.
pub fn brightness_offset(brightness: f32) -> f32 {
    brightness * 50.0 - 50.0
}

/// Apply `out = clamp(in * contrast + brightness_offset(brightness), 0, 255)`
/// to every channel sample in place.
pub fn adjust_contrast_brightness<P>(image: &mut ImageBuffer<P, Vec<u8>>, contrast: f32, brightness: f32)
where
    P: Pixel<Subpixel = u8>,
{
    let offset = brightness_offset(brightness);
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = (value as f32 * contrast + offset).round_ties_even().clamp(0.0, 255.0) as u8;
    }

    let samples: &mut [u8] = image;
    for sample in samples.iter_mut() {
        *sample = lut[*sample as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_brightness_offset() {
        assert_eq!(brightness_offset(1.0), 0.0);
        assert_eq!(brightness_offset(0.0), -50.0);
        assert_eq!(brightness_offset(2.0), 50.0);
    }

    #[test]
    fn test_adjust_identity() {
        let mut img = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 16 + y) as u8]));
        let before = img.clone();
        adjust_contrast_brightness(&mut img, 1.0, 1.0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_adjust_clamps() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([0]));
        img.put_pixel(1, 0, Luma([100]));
        img.put_pixel(2, 0, Luma([200]));

        adjust_contrast_brightness(&mut img, 1.5, 1.0);
        assert_eq!(img.as_raw(), &vec![0, 150, 255]);

        let mut dark = GrayImage::from_pixel(1, 1, Luma([30]));
        adjust_contrast_brightness(&mut dark, 1.0, 0.0);
        assert_eq!(dark.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_adjust_rounds_half_to_even() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([1]));
        img.put_pixel(1, 0, Luma([3]));

        adjust_contrast_brightness(&mut img, 1.5, 1.0);
        // 1.5 -> 2, 4.5 -> 4
        assert_eq!(img.as_raw(), &vec![2, 4]);
    }

    #[test]
    fn test_adjust_rgb_per_channel() {
        let mut img = RgbImage::from_pixel(2, 2, Rgb([10, 100, 250]));
        adjust_contrast_brightness(&mut img, 2.0, 1.0);
        assert_eq!(img.get_pixel(1, 1), &Rgb([20, 200, 255]));
    }

    #[test]
    fn test_denoise_removes_isolated_pixel() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([255]));
        img.put_pixel(4, 4, Luma([0]));

        let cleaned = denoise(&img);
        assert_eq!(cleaned.get_pixel(4, 4)[0], 255);
        assert_eq!(cleaned.dimensions(), (9, 9));
    }

    #[test]
    fn test_denoise_keeps_solid_regions() {
        let img = GrayImage::from_fn(12, 12, |x, _| if x < 6 { Luma([0]) } else { Luma([255]) });
        let cleaned = denoise(&img);
        assert_eq!(cleaned.get_pixel(2, 5)[0], 0);
        assert_eq!(cleaned.get_pixel(9, 5)[0], 255);
    }
}
