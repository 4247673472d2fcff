//! Tabular view of recognized text.
//!
//! A [`Table`] is produced by [`infer_table`] and then edited cell by cell.
//! Rows are stored exactly as inferred; padding to the header width only
//! happens when a row is materialized for display or export.
mod inference;

pub use inference::{SINGLE_COLUMN_HEADER, infer_table};

use crate::{OcrSheetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column delimiters recognized by table inference, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Tab,
    DoubleSpace,
    Pipe,
    Comma,
    Semicolon,
}

impl Delimiter {
    /// Candidates in detection order.
    pub const PRIORITY: [Delimiter; 5] = [
        Delimiter::Tab,
        Delimiter::DoubleSpace,
        Delimiter::Pipe,
        Delimiter::Comma,
        Delimiter::Semicolon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Tab => "\t",
            Delimiter::DoubleSpace => "  ",
            Delimiter::Pipe => "|",
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Delimiter::Tab => "tab",
            Delimiter::DoubleSpace => "double-space",
            Delimiter::Pipe => "pipe",
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
        };
        f.write_str(name)
    }
}

/// Headers plus rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Delimiter the table was split on; `None` in single-column mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<Delimiter>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows,
            delimiter: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Row `index` right-padded with empty cells to the header width.
    /// Longer rows are returned in full.
    pub fn padded_row(&self, index: usize) -> Option<Vec<String>> {
        self.rows.get(index).map(|row| pad_row(row, self.headers.len()))
    }

    /// Every row, padded as by [`Table::padded_row`].
    pub fn padded_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|row| pad_row(row, self.headers.len())).collect()
    }

    /// Value shown at `(row, column)`; padded cells read as `""`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        let cells = self.rows.get(row)?;
        match cells.get(column) {
            Some(value) => Some(value.as_str()),
            None if column < self.headers.len() => Some(""),
            None => None,
        }
    }

    /// Overwrite one cell.
    ///
    /// `column` may address any displayed cell: up to the header width, or
    /// the row's own width when it is longer. A short row is extended with
    /// empty cells up to `column`. Row and header counts never change.
    /// Surrounding whitespace in `value` is dropped.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let width = self.headers.len();
        let row_count = self.rows.len();
        let Some(cells) = self.rows.get_mut(row) else {
            return Err(OcrSheetError::validation(format!(
                "Row {} out of range (table has {} rows)",
                row, row_count
            )));
        };

        let limit = width.max(cells.len());
        if column >= limit {
            return Err(OcrSheetError::validation(format!(
                "Column {} out of range (row {} has {} columns)",
                column, row, limit
            )));
        }

        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.into().trim().to_string();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.headers.clear();
        self.rows.clear();
        self.delimiter = None;
    }

    /// Render as a GitHub-flavoured markdown table.
    ///
    /// Rows longer than the header are shown in full; missing header cells
    /// render blank.
    pub fn to_markdown(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut out = String::new();
        out.push_str(&markdown_line(&pad_row(&self.headers, width)));
        out.push_str(&markdown_line(&vec!["---".to_string(); width]));
        for row in &self.rows {
            out.push_str(&markdown_line(&pad_row(row, width)));
        }
        out
    }
}

fn pad_row(row: &[String], width: usize) -> Vec<String> {
    let mut padded = row.to_vec();
    if padded.len() < width {
        padded.resize(width, String::new());
    }
    padded
}

fn markdown_line(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|cell| cell.replace('|', "\\|")).collect();
    format!("| {} |\n", escaped.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            strings(&["Name", "Qty", "Price"]),
            vec![strings(&["apple", "3", "1.20"]), strings(&["pear"]), strings(&["fig", "1", "0.5", "extra"])],
        )
    }

    #[test]
    fn test_padded_rows_pad_but_never_truncate() {
        let table = sample();
        let padded = table.padded_rows();
        assert_eq!(padded[0].len(), 3);
        assert_eq!(padded[1], strings(&["pear", "", ""]));
        assert_eq!(padded[2].len(), 4);
        assert_eq!(table.rows[1], strings(&["pear"]));
    }

    #[test]
    fn test_cell_reads_padding_as_empty() {
        let table = sample();
        assert_eq!(table.cell(1, 0), Some("pear"));
        assert_eq!(table.cell(1, 2), Some(""));
        assert_eq!(table.cell(2, 3), Some("extra"));
        assert_eq!(table.cell(1, 3), None);
        assert_eq!(table.cell(9, 0), None);
    }

    #[test]
    fn test_set_cell_changes_only_target() {
        let mut table = sample();
        let before = table.clone();
        table.set_cell(0, 0, "banana").unwrap();

        assert_eq!(table.rows[0][0], "banana");
        assert_eq!(table.headers, before.headers);
        assert_eq!(table.row_count(), before.row_count());
        assert_eq!(table.rows[0][1..], before.rows[0][1..]);
        assert_eq!(table.rows[1..], before.rows[1..]);
    }

    #[test]
    fn test_set_cell_trims_value() {
        let mut table = sample();
        table.set_cell(0, 1, "  12 \n").unwrap();
        assert_eq!(table.cell(0, 1), Some("12"));

        table.set_cell(0, 2, "\t").unwrap();
        assert_eq!(table.cell(0, 2), Some(""));
    }

    #[test]
    fn test_set_cell_extends_short_row() {
        let mut table = sample();
        table.set_cell(1, 2, "9.99").unwrap();
        assert_eq!(table.rows[1], strings(&["pear", "", "9.99"]));
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_set_cell_allows_long_row_tail() {
        let mut table = sample();
        table.set_cell(2, 3, "note").unwrap();
        assert_eq!(table.rows[2][3], "note");
    }

    #[test]
    fn test_set_cell_out_of_range() {
        let mut table = sample();
        assert!(matches!(
            table.set_cell(5, 0, "x").unwrap_err(),
            OcrSheetError::Validation { .. }
        ));
        assert!(matches!(
            table.set_cell(0, 3, "x").unwrap_err(),
            OcrSheetError::Validation { .. }
        ));
        assert_eq!(table, sample());
    }

    #[test]
    fn test_clear() {
        let mut table = sample();
        table.delimiter = Some(Delimiter::Tab);
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.delimiter, None);
    }

    #[test]
    fn test_to_markdown() {
        let table = Table::new(strings(&["a", "b"]), vec![strings(&["1"]), strings(&["x|y", "2"])]);
        let md = table.to_markdown();
        assert_eq!(md, "| a | b |\n| --- | --- |\n| 1 |  |\n| x\\|y | 2 |\n");
    }

    #[test]
    fn test_to_markdown_empty() {
        assert_eq!(Table::default().to_markdown(), "");
    }

    #[test]
    fn test_delimiter_priority_and_display() {
        assert_eq!(Delimiter::PRIORITY[0], Delimiter::Tab);
        assert_eq!(Delimiter::PRIORITY[4], Delimiter::Semicolon);
        assert_eq!(Delimiter::DoubleSpace.as_str(), "  ");
        assert_eq!(Delimiter::Pipe.to_string(), "pipe");
    }

    #[test]
    fn test_table_json_shape() {
        let mut table = Table::new(strings(&["h"]), vec![strings(&["v"])]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"headers": ["h"], "rows": [["v"]]}));

        table.delimiter = Some(Delimiter::Comma);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["delimiter"], "comma");
    }
}
