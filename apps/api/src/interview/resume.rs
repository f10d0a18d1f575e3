//! Resume text extraction for PDF uploads.

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts plain text from an uploaded resume PDF.
/// CPU-bound: call from `spawn_blocking`.
pub fn extract_resume_text(bytes: &[u8]) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(AppError::Validation(
            "resume must be a PDF document".to_string(),
        ));
    }

    let raw = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read resume PDF: {e}")))?;

    let text = tidy_text(&raw);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "resume PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

/// Trims each line and collapses runs of blank lines left behind by PDF layout.
fn tidy_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = false;

    for line in raw.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_start());
    }
    out
}
