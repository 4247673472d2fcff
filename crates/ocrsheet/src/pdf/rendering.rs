use super::PdfRenderOptions;
use crate::{OcrSheetError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;

fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| OcrSheetError::MissingDependency(format!("Pdfium library not available: {}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn load_error(err: PdfiumError) -> OcrSheetError {
    let message = err.to_string();
    if message.contains("password") || message.contains("Password") {
        OcrSheetError::load("PDF is password protected")
    } else {
        OcrSheetError::load(format!("Invalid PDF: {}", message))
    }
}

fn render_document(document: &PdfDocument<'_>, options: &PdfRenderOptions) -> Result<Vec<DynamicImage>> {
    let pages = document.pages();
    let indices = options.page_indices(pages.len() as u32)?;
    let scale = options.scale();
    let mut images = Vec::with_capacity(indices.len());

    for index in indices {
        let page = pages
            .get(index as u16)
            .map_err(|e| OcrSheetError::load(format!("Page {} not found: {}", index + 1, e)))?;

        let config = PdfRenderConfig::new()
            .set_target_width(((page.width().value * scale) as i32).max(1))
            .set_target_height(((page.height().value * scale) as i32).max(1));

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| OcrSheetError::load(format!("Failed to render page {}: {}", index + 1, e)))?;

        images.push(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()));
    }

    tracing::debug!(pages = images.len(), dpi = options.dpi, "Rendered PDF pages");
    Ok(images)
}

/// Render the selected pages of a PDF file, one image per page.
pub fn render_pdf_file(path: &Path, options: &PdfRenderOptions) -> Result<Vec<DynamicImage>> {
    if !path.exists() {
        return Err(OcrSheetError::load(format!("File not found: {}", path.display())));
    }
    let pdfium = bind_pdfium()?;
    let document = pdfium.load_pdf_from_file(path, None).map_err(load_error)?;
    render_document(&document, options)
}

/// Render the selected pages of an in-memory PDF.
pub fn render_pdf_bytes(bytes: &[u8], options: &PdfRenderOptions) -> Result<Vec<DynamicImage>> {
    let pdfium = bind_pdfium()?;
    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(load_error)?;
    render_document(&document, options)
}

/// Number of pages in a PDF file.
pub fn page_count(path: &Path) -> Result<u32> {
    let pdfium = bind_pdfium()?;
    let document = pdfium.load_pdf_from_file(path, None).map_err(load_error)?;
    Ok(document.pages().len() as u32)
}
