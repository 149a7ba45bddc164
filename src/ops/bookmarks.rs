//! Bookmark edits.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::editor;
use crate::util;
use std::path::Path;

/// Remove the entire bookmark tree from a document.
pub fn delete_all_bookmarks(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    delete_inner(input, output)
        .map_err(|e| Error::bookmarks(format!("Failed to delete bookmarks in PDF: {}", e)))
}

fn delete_inner(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let cleared = editor::clear_bookmarks(&data)?;

    let output = util::resolve_output_path(input, output, "deleteallbookmarks", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &cleared)?;

    Ok(OpOutcome::single(
        format!("Deleted bookmarks, saved to: {}", output.display()),
        output,
    ))
}

/// Open every bookmark node so viewers show the outline expanded.
pub fn expand_bookmarks(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    expand_inner(input, output)
        .map_err(|e| Error::bookmarks(format!("Failed to expand bookmarks in PDF: {}", e)))
}

fn expand_inner(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let expanded = editor::expand_bookmarks(&data)?;

    let output = util::resolve_output_path(input, output, "expandbookmarks", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &expanded)?;

    Ok(OpOutcome::single(
        format!("Expanded bookmarks, saved to: {}", output.display()),
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_missing_input_is_bookmarks_error() {
        let result = delete_all_bookmarks(Path::new("/nonexistent/input.pdf"), None);
        assert!(matches!(result, Err(Error::Bookmarks { .. })));
    }

    #[test]
    fn test_expand_missing_input_is_bookmarks_error() {
        let result = expand_bookmarks(Path::new("/nonexistent/input.pdf"), None);
        assert!(matches!(result, Err(Error::Bookmarks { .. })));
    }

    #[test]
    fn test_delete_writes_derived_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        crate::ops::document::create_document(&input).unwrap();

        let outcome = delete_all_bookmarks(&input, None).unwrap();

        let expected = dir.path().join("report-deleteallbookmarks.pdf");
        assert_eq!(outcome.outputs, vec![expected.clone()]);
        assert!(expected.exists());
    }
}
