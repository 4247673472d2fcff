//! Locating Tesseract language data.
use crate::{OcrSheetError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Install locations searched when neither the configuration nor
/// `TESSDATA_PREFIX` names a directory.
pub const FALLBACK_TESSDATA_PATHS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r#"C:\Program Files\Tesseract-OCR\tessdata"#,
    r#"C:\ProgramData\Tesseract-OCR\tessdata"#,
];

/// Resolve the tessdata directory.
///
/// Order: the configured path, `TESSDATA_PREFIX`, then the first existing
/// entry of [`FALLBACK_TESSDATA_PATHS`]. Returns `None` when nothing is
/// found, in which case the engine uses its compiled-in default.
pub fn resolve_tessdata_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path.to_path_buf());
    }

    if let Some(prefix) = env::var_os("TESSDATA_PREFIX").filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(prefix));
    }

    FALLBACK_TESSDATA_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

/// Check a (possibly `+`-joined) language code against a tessdata
/// directory.
///
/// The engine can abort the process on an empty language or a missing
/// traineddata file instead of returning an error, so both are rejected
/// here first.
pub fn validate_language(language: &str, tessdata_dir: Option<&Path>) -> Result<()> {
    if language.trim().is_empty() {
        return Err(OcrSheetError::ocr(
            "Language cannot be empty. Please specify a valid language code (e.g., 'eng')",
        ));
    }

    let Some(dir) = tessdata_dir else {
        return Ok(());
    };

    for lang in language.split('+').map(str::trim).filter(|l| !l.is_empty()) {
        let traineddata = dir.join(format!("{}.traineddata", lang));
        if !traineddata.exists() {
            return Err(OcrSheetError::ocr(format!(
                "Language '{}' not found. Traineddata file does not exist: {}",
                lang,
                traineddata.display()
            )));
        }
    }

    Ok(())
}
