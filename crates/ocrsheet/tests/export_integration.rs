//! CSV export of inferred tables, read back with the `csv` reader.

use ocrsheet::{OcrSheetError, export_csv, infer_table, save_text};
use tempfile::tempdir;

fn read_records(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_export_writes_headers_then_padded_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let table = infer_table("Name|City\nAna|Lisbon, PT\nBo");

    export_csv(&table, &path).unwrap();

    let records = read_records(&path);
    assert_eq!(
        records,
        vec![
            vec!["Name".to_string(), "City".to_string()],
            vec!["Ana".to_string(), "Lisbon, PT".to_string()],
            vec!["Bo".to_string(), String::new()],
        ]
    );
}

#[test]
fn test_single_column_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lines.csv");
    export_csv(&infer_table("first line\nsecond line"), &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "Extracted Text\nfirst line\nsecond line\n");
}

#[test]
fn test_failed_export_reports_error() {
    let dir = tempdir().unwrap();
    let table = infer_table("a,b\n1,2");

    let err = export_csv(&table, dir.path()).unwrap_err();
    assert!(matches!(err, OcrSheetError::Export { .. }));

    let err = export_csv(&infer_table(""), dir.path().join("empty.csv")).unwrap_err();
    assert!(matches!(err, OcrSheetError::Validation { .. }));
}

#[test]
fn test_save_text_keeps_original_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    save_text("a\tb\n\n  c  \n", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\tb\n\n  c  \n");
}
