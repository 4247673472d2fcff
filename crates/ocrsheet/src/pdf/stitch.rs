use crate::{OcrSheetError, Result};
use image::imageops;
use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// How pages are laid out when stitched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StitchDirection {
    /// Pages stacked top to bottom, centred horizontally.
    #[default]
    Vertical,
    /// Pages side by side, centred vertically.
    Horizontal,
}

/// Join pages into one image on a white canvas.
pub fn stitch_pages(pages: &[DynamicImage], direction: StitchDirection) -> Result<DynamicImage> {
    match pages {
        [] => Err(OcrSheetError::validation("No pages to stitch")),
        [single] => Ok(single.clone()),
        _ => {
            let (width, height) = match direction {
                StitchDirection::Vertical => (
                    pages.iter().map(|p| p.width()).max().unwrap_or(0),
                    pages.iter().map(|p| p.height()).sum::<u32>(),
                ),
                StitchDirection::Horizontal => (
                    pages.iter().map(|p| p.width()).sum::<u32>(),
                    pages.iter().map(|p| p.height()).max().unwrap_or(0),
                ),
            };

            let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
            let mut offset = 0i64;
            for page in pages {
                let rgb = page.to_rgb8();
                match direction {
                    StitchDirection::Vertical => {
                        let x = (width - page.width()) as i64 / 2;
                        imageops::replace(&mut canvas, &rgb, x, offset);
                        offset += page.height() as i64;
                    }
                    StitchDirection::Horizontal => {
                        let y = (height - page.height()) as i64 / 2;
                        imageops::replace(&mut canvas, &rgb, offset, y);
                        offset += page.width() as i64;
                    }
                }
            }

            tracing::debug!(pages = pages.len(), width, height, ?direction, "Stitched pages");
            Ok(DynamicImage::ImageRgb8(canvas))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
    }

    #[test]
    fn test_vertical_centres_narrow_pages() {
        let pages = vec![page(10, 4, 0), page(6, 3, 100)];
        let stitched = stitch_pages(&pages, StitchDirection::Vertical).unwrap().to_rgb8();

        assert_eq!(stitched.dimensions(), (10, 7));
        assert_eq!(stitched.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(stitched.get_pixel(1, 5), &Rgb([255, 255, 255]));
        assert_eq!(stitched.get_pixel(2, 5), &Rgb([100, 100, 100]));
        assert_eq!(stitched.get_pixel(7, 5), &Rgb([100, 100, 100]));
        assert_eq!(stitched.get_pixel(8, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_horizontal_centres_short_pages() {
        let pages = vec![page(3, 8, 0), page(2, 4, 50)];
        let stitched = stitch_pages(&pages, StitchDirection::Horizontal).unwrap().to_rgb8();

        assert_eq!(stitched.dimensions(), (5, 8));
        assert_eq!(stitched.get_pixel(3, 1), &Rgb([255, 255, 255]));
        assert_eq!(stitched.get_pixel(3, 2), &Rgb([50, 50, 50]));
        assert_eq!(stitched.get_pixel(4, 5), &Rgb([50, 50, 50]));
        assert_eq!(stitched.get_pixel(4, 6), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_single_page_passthrough() {
        let pages = vec![page(4, 4, 9)];
        let stitched = stitch_pages(&pages, StitchDirection::Vertical).unwrap();
        assert_eq!(stitched, pages[0]);
    }

    #[test]
    fn test_no_pages() {
        assert!(stitch_pages(&[], StitchDirection::Vertical).is_err());
    }
}
