//! Spreadsheet and text export.
//!
//! Tables are written as an Excel workbook (`.xlsx`) or as CSV: the headers
//! first, then every row padded to the header width in table order. Rows
//! longer than the header are written in full. Failures to write are
//! `OcrSheetError::Export`; the table itself is never touched.
use crate::table::Table;
use crate::{OcrSheetError, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Worksheet that holds the exported table.
pub const XLSX_SHEET_NAME: &str = "Sheet1";

/// Spreadsheet file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` selects CSV; everything else is a workbook.
    pub fn from_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv { ExportFormat::Csv } else { ExportFormat::Xlsx }
    }
}

/// Write `table` as CSV to any writer.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    csv_writer
        .write_record(&table.headers)
        .map_err(|e| OcrSheetError::export_with_source("Failed to write CSV header", e))?;
    for row in table.padded_rows() {
        csv_writer
            .write_record(&row)
            .map_err(|e| OcrSheetError::export_with_source("Failed to write CSV row", e))?;
    }
    csv_writer
        .flush()
        .map_err(|e| OcrSheetError::export_with_source("Failed to flush CSV output", e))?;
    Ok(())
}

/// Export `table` to a CSV file at `path`.
///
/// # Errors
///
/// - `OcrSheetError::Validation` if the table is empty
/// - `OcrSheetError::Export` if the file cannot be created or written
pub fn export_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if table.is_empty() {
        return Err(OcrSheetError::validation("No table data to export"));
    }

    let file = File::create(path)
        .map_err(|e| OcrSheetError::export_with_source(format!("Cannot create {}", path.display()), e))?;
    write_csv(table, BufWriter::new(file))?;

    tracing::info!(rows = table.row_count(), "Exported table to {}", path.display());
    Ok(())
}

fn xlsx_error(context: &str, err: XlsxError) -> OcrSheetError {
    OcrSheetError::export(format!("{}: {}", context, err))
}

fn cell_position(row: usize, column: usize) -> Result<(u32, u16)> {
    let row = u32::try_from(row).map_err(|_| OcrSheetError::export(format!("Row {} exceeds the sheet", row)))?;
    let column =
        u16::try_from(column).map_err(|_| OcrSheetError::export(format!("Column {} exceeds the sheet", column)))?;
    Ok((row, column))
}

/// Render `table` as an in-memory `.xlsx` workbook with a single sheet.
///
/// Headers go to the first row in bold; empty padding cells are left blank.
pub fn write_xlsx(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(XLSX_SHEET_NAME)
        .map_err(|e| xlsx_error("Invalid sheet name", e))?;

    for (column, header) in table.headers.iter().enumerate() {
        let (row, column) = cell_position(0, column)?;
        worksheet
            .write_string_with_format(row, column, header.as_str(), &header_format)
            .map_err(|e| xlsx_error("Failed to write header", e))?;
    }

    for (index, cells) in table.padded_rows().iter().enumerate() {
        for (column, value) in cells.iter().enumerate().filter(|(_, value)| !value.is_empty()) {
            let (row, column) = cell_position(index + 1, column)?;
            worksheet
                .write_string(row, column, value.as_str())
                .map_err(|e| xlsx_error("Failed to write cell", e))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| xlsx_error("Failed to build workbook", e))
}

/// Export `table` to an Excel workbook at `path`.
///
/// # Errors
///
/// - `OcrSheetError::Validation` if the table is empty
/// - `OcrSheetError::Export` if the workbook cannot be built or written
pub fn export_xlsx(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if table.is_empty() {
        return Err(OcrSheetError::validation("No table data to export"));
    }

    let bytes = write_xlsx(table)?;
    std::fs::write(path, bytes)
        .map_err(|e| OcrSheetError::export_with_source(format!("Cannot write {}", path.display()), e))?;

    tracing::info!(rows = table.row_count(), "Exported table to {}", path.display());
    Ok(())
}

/// Export `table` in the format picked by the extension of `path`.
pub fn export_table(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match ExportFormat::from_path(path) {
        ExportFormat::Xlsx => export_xlsx(table, path),
        ExportFormat::Csv => export_csv(table, path),
    }
}

/// Write the recognized text to `path` unchanged.
///
/// # Errors
///
/// - `OcrSheetError::Validation` if there is no text
/// - `OcrSheetError::Export` if the file cannot be written
pub fn save_text(text: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if text.is_empty() {
        return Err(OcrSheetError::validation("No recognized text to save"));
    }

    std::fs::write(path, text)
        .map_err(|e| OcrSheetError::export_with_source(format!("Cannot write {}", path.display()), e))?;
    tracing::info!("Saved recognized text to {}", path.display());
    Ok(())
}
