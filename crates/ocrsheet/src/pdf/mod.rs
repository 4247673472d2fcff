//! PDF input.
//!
//! Pages are rendered to raster images by Pdfium (feature `pdf`) and can be
//! stitched into a single image so a whole document runs as one job.
#[cfg(feature = "pdf")]
mod rendering;
mod stitch;

#[cfg(feature = "pdf")]
pub use rendering::{page_count, render_pdf_bytes, render_pdf_file};
pub use stitch::{StitchDirection, stitch_pages};

use crate::{OcrSheetError, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Points per inch in PDF user space.
pub const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Which pages to render and at what resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfRenderOptions {
    pub dpi: u32,
    /// First page, 1-based inclusive.
    pub first_page: Option<u32>,
    /// Last page, 1-based inclusive.
    pub last_page: Option<u32>,
}

impl Default for PdfRenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            first_page: None,
            last_page: None,
        }
    }
}

impl PdfRenderOptions {
    /// Zero-based page indices to render for a document of `page_count`
    /// pages. A last page past the end is clamped.
    pub fn page_indices(&self, page_count: u32) -> Result<std::ops::Range<u32>> {
        if self.dpi == 0 {
            return Err(OcrSheetError::validation("DPI must be greater than 0"));
        }
        let first = self.first_page.unwrap_or(1);
        let last = self.last_page.unwrap_or(page_count).min(page_count);

        if first == 0 {
            return Err(OcrSheetError::validation("Page numbers start at 1"));
        }
        if first > page_count {
            return Err(OcrSheetError::validation(format!(
                "First page {} is beyond the last page of the document ({})",
                first, page_count
            )));
        }
        if last < first {
            return Err(OcrSheetError::validation(format!(
                "Last page {} is before first page {}",
                last, first
            )));
        }

        Ok(first - 1..last)
    }

    /// Scale factor from PDF points to pixels.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / PDF_POINTS_PER_INCH
    }
}

/// File name for a rendered page, e.g. `page_001.png`.
pub fn page_file_name(page_number: u32, format: ImageFormat) -> String {
    let extension = format.extensions_str().first().copied().unwrap_or("png");
    format!("page_{:03}.{}", page_number, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_indices_full_document() {
        let options = PdfRenderOptions::default();
        assert_eq!(options.page_indices(5).unwrap(), 0..5);
    }

    #[test]
    fn test_page_indices_range_and_clamp() {
        let options = PdfRenderOptions {
            first_page: Some(2),
            last_page: Some(3),
            ..Default::default()
        };
        assert_eq!(options.page_indices(5).unwrap(), 1..3);

        let options = PdfRenderOptions {
            first_page: Some(4),
            last_page: Some(99),
            ..Default::default()
        };
        assert_eq!(options.page_indices(5).unwrap(), 3..5);
    }

    #[test]
    fn test_page_indices_invalid() {
        let beyond = PdfRenderOptions {
            first_page: Some(6),
            ..Default::default()
        };
        assert!(beyond.page_indices(5).is_err());

        let zero = PdfRenderOptions {
            first_page: Some(0),
            ..Default::default()
        };
        assert!(zero.page_indices(5).is_err());

        let reversed = PdfRenderOptions {
            first_page: Some(3),
            last_page: Some(2),
            ..Default::default()
        };
        assert!(reversed.page_indices(5).is_err());

        let no_dpi = PdfRenderOptions {
            dpi: 0,
            ..Default::default()
        };
        assert!(no_dpi.page_indices(5).is_err());
    }

    #[test]
    fn test_scale() {
        let options = PdfRenderOptions {
            dpi: 144,
            ..Default::default()
        };
        assert_eq!(options.scale(), 2.0);
    }

    #[test]
    fn test_page_file_name() {
        assert_eq!(page_file_name(1, ImageFormat::Png), "page_001.png");
        assert_eq!(page_file_name(12, ImageFormat::Jpeg), "page_012.jpg");
        assert_eq!(page_file_name(1234, ImageFormat::Png), "page_1234.png");
    }
}
