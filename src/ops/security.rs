//! Encryption and decryption.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::QpdfEngine;
use crate::util;
use std::path::Path;

/// Encrypt a document with user and owner passwords. Printing and form
/// filling remain allowed, every other privilege is forbidden.
pub fn encrypt_document(
    input: &Path,
    user_password: &str,
    owner_password: Option<&str>,
) -> Result<OpOutcome> {
    encrypt_inner(input, user_password, owner_password)
        .map_err(|e| Error::security(format!("Failed to encrypt the PDF: {}", e)))
}

fn encrypt_inner(
    input: &Path,
    user_password: &str,
    owner_password: Option<&str>,
) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let encrypted = QpdfEngine::encrypt(&data, user_password, owner_password)?;

    let output = util::derived_output_path(input, "encrypt", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &encrypted)?;

    Ok(OpOutcome::single(
        format!("Encrypted PDF saved to: {}", output.display()),
        output,
    ))
}

/// Remove password protection from a document.
pub fn decrypt_document(input: &Path, password: &str) -> Result<OpOutcome> {
    decrypt_inner(input, password)
        .map_err(|e| Error::security(format!("Failed to decrypt the PDF: {}", e)))
}

fn decrypt_inner(input: &Path, password: &str) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let decrypted = QpdfEngine::decrypt(&data, password)?;

    let output = util::derived_output_path(input, "decrypt", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &decrypted)?;

    Ok(OpOutcome::single(
        format!("Decrypted PDF saved to: {}", output.display()),
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_missing_input_is_security_error() {
        let result = encrypt_document(Path::new("/nonexistent/input.pdf"), "user", None);
        assert!(matches!(result, Err(Error::Security { .. })));
    }

    #[test]
    fn test_decrypt_missing_input_is_security_error() {
        let result = decrypt_document(Path::new("/nonexistent/input.pdf"), "secret");
        assert!(matches!(result, Err(Error::Security { .. })));
    }
}
