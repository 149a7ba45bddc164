//! Text replacement.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::editor;
use crate::util;
use std::path::Path;

/// Replace every occurrence of `old_text` with `new_text` across all pages.
pub fn replace_all_text(input: &Path, old_text: &str, new_text: &str) -> Result<OpOutcome> {
    replace_inner(input, old_text, new_text)
        .map_err(|e| Error::text(format!("Failed to replace text in PDF document: {}", e)))
}

fn replace_inner(input: &Path, old_text: &str, new_text: &str) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let (replaced, pages_changed) = editor::replace_text(&data, old_text, new_text)?;

    let output = util::derived_output_path(input, "replacetext", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &replaced)?;

    Ok(OpOutcome::single(
        format!(
            "Replaced text on {} pages, saved to: {}",
            pages_changed,
            output.display()
        ),
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_text_error() {
        let result = replace_all_text(Path::new("/nonexistent/input.pdf"), "old", "new");
        assert!(matches!(result, Err(Error::Text { .. })));
    }

    #[test]
    fn test_replace_writes_derived_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("letter.pdf");
        crate::ops::document::create_document(&input).unwrap();

        let outcome = replace_all_text(&input, "absent text", "replacement").unwrap();

        let expected = dir.path().join("letter-replacetext.pdf");
        assert_eq!(outcome.outputs, vec![expected.clone()]);
        assert!(expected.exists());
    }
}
