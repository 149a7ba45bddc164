//! Attachment edits.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::editor;
use crate::util;
use std::path::Path;

/// Remove every document-level attachment.
pub fn delete_all_attachments(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    delete_inner(input, output).map_err(|e| {
        Error::attachments(format!("Failed to delete attachments in PDF document: {}", e))
    })
}

fn delete_inner(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let cleared = editor::clear_attachments(&data)?;

    let output = util::resolve_output_path(input, output, "deleteallattachments", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &cleared)?;

    Ok(OpOutcome::single(
        format!("Deleted all attachments, saved to: {}", output.display()),
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_attachments_error() {
        let result = delete_all_attachments(Path::new("/nonexistent/input.pdf"), None);
        assert!(matches!(result, Err(Error::Attachments { .. })));
    }

    #[test]
    fn test_delete_writes_derived_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bundle.pdf");
        crate::ops::document::create_document(&input).unwrap();

        let outcome = delete_all_attachments(&input, None).unwrap();

        let expected = dir.path().join("bundle-deleteallattachments.pdf");
        assert_eq!(outcome.outputs, vec![expected.clone()]);
        assert!(expected.exists());
    }
}
