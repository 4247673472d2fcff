//! Integration tests for the `ocrsheet` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn ocrsheet(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ocrsheet"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run ocrsheet")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_infer_prints_csv() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("table.txt");
    std::fs::write(&input, "Item\tQty\nBolts\t40\nNuts\n").unwrap();

    let output = ocrsheet(
        &dir.path().join("settings.json"),
        &["infer", input.to_str().unwrap(), "--format", "csv"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output), "Item,Qty\nBolts,40\nNuts,\n");
}

#[test]
fn test_infer_markdown_and_export() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("lines.txt");
    let csv = dir.path().join("lines.csv");
    std::fs::write(&input, "hello\nworld").unwrap();

    let output = ocrsheet(
        &dir.path().join("settings.json"),
        &["infer", input.to_str().unwrap(), "--csv", csv.to_str().unwrap()],
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "| Extracted Text |\n| --- |\n| hello |\n| world |\n"
    );
    assert_eq!(
        std::fs::read_to_string(&csv).unwrap(),
        "Extracted Text\nhello\nworld\n"
    );
}

#[test]
fn test_config_set_then_get() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");

    let output = ocrsheet(&config, &["config", "set", "ocr.psm", "4"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = ocrsheet(&config, &["config", "get", "ocr.psm"]);
    assert_eq!(stdout(&output).trim(), "4");

    let output = ocrsheet(&config, &["config", "get", "ocr.language"]);
    assert_eq!(stdout(&output).trim(), "eng");

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(written["ocr"]["psm"], serde_json::json!(4));
}

#[test]
fn test_config_rejects_invalid_value() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");

    let output = ocrsheet(&config, &["config", "set", "preprocessing.threshold", "magic"]);
    assert!(!output.status.success());

    let output = ocrsheet(&config, &["config", "get", "no.such.key"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_path_and_show() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");

    let output = ocrsheet(&config, &["config", "path"]);
    assert_eq!(stdout(&output).trim(), config.display().to_string());

    let output = ocrsheet(&config, &["config", "show"]);
    let shown: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    for section in ["app", "paths", "ocr", "preprocessing", "ui"] {
        assert!(shown.get(section).is_some(), "missing section {}", section);
    }
}

#[test]
fn test_infer_exports_xlsx() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("table.txt");
    let xlsx = dir.path().join("table.xlsx");
    std::fs::write(&input, "a;b\n1;2\n").unwrap();

    let output = ocrsheet(
        &dir.path().join("settings.json"),
        &["infer", input.to_str().unwrap(), "--xlsx", xlsx.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(std::fs::read(&xlsx).unwrap().starts_with(b"PK"));
}

#[test]
fn test_process_missing_input_reports_load_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.png");

    let output = ocrsheet(&dir.path().join("settings.json"), &["process", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"), "{}", stderr);
}

#[cfg(not(feature = "ocr"))]
#[test]
fn test_process_without_engine_fails() {
    let dir = tempdir().unwrap();
    let scan = dir.path().join("scan.png");
    image::GrayImage::from_pixel(8, 8, image::Luma([255])).save(&scan).unwrap();

    let output = ocrsheet(&dir.path().join("settings.json"), &["process", scan.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--features ocr"));
}
