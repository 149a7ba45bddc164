//! Document lifecycle operations: create, extract text, merge, watermark,
//! compress, and split.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::{editor, QpdfEngine, WatermarkStyle};
use crate::util;
use std::path::{Path, PathBuf};

/// Create a new blank single-page PDF document at `path`.
pub fn create_document(path: &Path) -> Result<OpOutcome> {
    create_inner(path)
        .map_err(|e| Error::document(format!("Failed to create PDF document: {}", e)))
}

fn create_inner(path: &Path) -> Result<OpOutcome> {
    util::ensure_parent_dir(path)?;
    let data = editor::new_blank_document()?;
    std::fs::write(path, &data)?;

    Ok(OpOutcome::single(
        format!("Created PDF document: {}", path.display()),
        path.to_path_buf(),
    ))
}

/// Extract the text of every page to a sibling `<stem>.txt` file.
pub fn extract_text(input: &Path) -> Result<OpOutcome> {
    extract_text_inner(input)
        .map_err(|e| Error::document(format!("Failed to extract text: {}", e)))
}

fn extract_text_inner(input: &Path) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let pages = crate::pdf::extract_all_text(&data, None)?;

    let output = util::sibling_path(input, "txt");
    util::write_text_report(&output, &pages)?;

    Ok(OpOutcome::single(
        format!("Extracted text to: {}", output.display()),
        output,
    ))
}

/// Merge the given documents, in order, into one output file.
///
/// Inputs that cannot be read are logged and skipped; the merge proceeds
/// with whatever remains and fails only when nothing is readable.
pub fn merge_documents(inputs: &[PathBuf], output: &Path) -> Result<OpOutcome> {
    merge_inner(inputs, output)
        .map_err(|e| Error::document(format!("Failed to merge PDFs: {}", e)))
}

fn merge_inner(inputs: &[PathBuf], output: &Path) -> Result<OpOutcome> {
    let mut readable = Vec::new();

    for path in inputs {
        match util::read_pdf_bytes(path) {
            Ok(data) => readable.push(data),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping merge input");
            }
        }
    }

    if readable.is_empty() {
        return Err(Error::InvalidPdf {
            reason: format!("no readable input PDFs among {} given", inputs.len()),
        });
    }

    let refs: Vec<&[u8]> = readable.iter().map(|data| data.as_slice()).collect();
    let merged = QpdfEngine::merge(&refs)?;

    util::ensure_parent_dir(output)?;
    std::fs::write(output, &merged)?;

    Ok(OpOutcome::single(
        format!(
            "Merged {} documents into: {}",
            refs.len(),
            output.display()
        ),
        output.to_path_buf(),
    ))
}

/// Stamp a tiled text watermark on every page.
pub fn add_text_watermark(
    input: &Path,
    output: Option<&str>,
    watermark_text: &str,
    style: &WatermarkStyle,
) -> Result<OpOutcome> {
    watermark_inner(input, output, watermark_text, style)
        .map_err(|e| Error::document(format!("Failed to add text watermark: {}", e)))
}

fn watermark_inner(
    input: &Path,
    output: Option<&str>,
    watermark_text: &str,
    style: &WatermarkStyle,
) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let marked = editor::add_text_watermark(&data, watermark_text, style)?;

    let output = util::resolve_output_path(input, output, "watermark", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &marked)?;

    Ok(OpOutcome::single(
        format!("Added text watermark, saved to: {}", output.display()),
        output,
    ))
}

/// Compress a document's streams to reduce file size.
pub fn compress_document(
    input: &Path,
    output: Option<&str>,
    object_streams: Option<&str>,
) -> Result<OpOutcome> {
    compress_inner(input, output, object_streams)
        .map_err(|e| Error::document(format!("Failed to compress document: {}", e)))
}

fn compress_inner(
    input: &Path,
    output: Option<&str>,
    object_streams: Option<&str>,
) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let compressed = QpdfEngine::compress(&data, None, object_streams)?;

    let output = util::resolve_output_path(input, output, "compress", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &compressed)?;

    Ok(OpOutcome::single(
        format!(
            "Compressed document saved to: {} ({} -> {} bytes)",
            output.display(),
            data.len(),
            compressed.len()
        ),
        output,
    ))
}

/// Split a document into one file per page, `<stem>-<i>.pdf` with i from 0.
pub fn split_document(input: &Path) -> Result<OpOutcome> {
    split_inner(input)
        .map_err(|e| Error::document(format!("Failed to split document: {}", e)))
}

fn split_inner(input: &Path) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let total = QpdfEngine::page_count(&data, None)?;

    let directory = input
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    util::ensure_writable_dir(directory)?;

    let mut outputs = Vec::with_capacity(total as usize);
    for index in 0..total {
        let page = QpdfEngine::extract_page(&data, index, None)?;
        let out = util::derived_output_path(input, &index.to_string(), "pdf");
        std::fs::write(&out, &page)?;
        outputs.push(out);
    }

    Ok(OpOutcome {
        message: format!(
            "Split {} pages into: {}",
            total,
            directory.display()
        ),
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_document_writes_single_page_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.pdf");

        let outcome = create_document(&path).unwrap();

        assert!(path.exists());
        assert_eq!(outcome.outputs, vec![path.clone()]);
        let doc = lopdf::Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_extract_text_missing_input_is_document_error() {
        let result = extract_text(Path::new("/nonexistent/input.pdf"));
        assert!(matches!(result, Err(Error::Document { .. })));
    }

    #[test]
    fn test_merge_all_inputs_missing_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = vec![
            dir.path().join("a.pdf"),
            dir.path().join("b.pdf"),
        ];
        let output = dir.path().join("merged.pdf");

        let result = merge_documents(&inputs, &output);
        assert!(matches!(result, Err(Error::Document { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_watermark_missing_input_is_document_error() {
        let result = add_text_watermark(
            Path::new("/nonexistent/input.pdf"),
            None,
            "DRAFT",
            &WatermarkStyle::default(),
        );
        assert!(matches!(result, Err(Error::Document { .. })));
    }

    #[test]
    fn test_watermark_writes_derived_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.pdf");
        create_document(&input).unwrap();

        let outcome =
            add_text_watermark(&input, None, "DRAFT", &WatermarkStyle::default()).unwrap();

        let expected = dir.path().join("plain-watermark.pdf");
        assert_eq!(outcome.outputs, vec![expected.clone()]);
        assert!(expected.exists());
        assert!(input.exists());
    }

    #[test]
    fn test_split_missing_input_is_document_error() {
        let result = split_document(Path::new("/nonexistent/input.pdf"));
        assert!(matches!(result, Err(Error::Document { .. })));
    }
}
