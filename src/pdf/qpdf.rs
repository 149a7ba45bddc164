//! qpdf FFI adapter for page assembly, security, and compression
//!
//! This module covers the engine work qpdf is responsible for: merging,
//! single-page extraction, encryption/decryption, stream compression, and
//! linearization, using the qpdf crate (vendored FFI).

use crate::error::{Error, Result};
use qpdf::{EncryptionParams, EncryptionParamsR6, ObjectStreamMode, PrintPermission, QPdf};

/// Adapter for qpdf operations via FFI
pub struct QpdfEngine;

/// Helper: open a QPdf from memory, optionally with password
fn open_qpdf(data: &[u8], password: Option<&str>) -> Result<QPdf> {
    match password {
        Some(pwd) => QPdf::read_from_memory_encrypted(data, pwd).map_err(map_qpdf_error),
        None => QPdf::read_from_memory(data).map_err(map_qpdf_error),
    }
}

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    match e.error_code() {
        qpdf::QPdfErrorCode::InvalidPassword => Error::IncorrectPassword,
        _ => Error::Qpdf {
            reason: e.to_string(),
        },
    }
}

impl QpdfEngine {
    /// Merge multiple PDFs into one, in order.
    pub fn merge(inputs: &[&[u8]]) -> Result<Vec<u8>> {
        if inputs.is_empty() {
            return Err(Error::Qpdf {
                reason: "No input PDFs provided".to_string(),
            });
        }

        let dest = QPdf::empty();

        for (i, input_data) in inputs.iter().enumerate() {
            let source = QPdf::read_from_memory(input_data).map_err(|e| Error::Qpdf {
                reason: format!("Failed to read input PDF {}: {}", i, e),
            })?;

            let pages = source.get_pages().map_err(|e| Error::Qpdf {
                reason: format!("Failed to get pages from input PDF {}: {}", i, e),
            })?;

            for page in &pages {
                let copied = dest.copy_from_foreign(page);
                dest.add_page(&copied, false).map_err(map_qpdf_error)?;
            }
        }

        dest.writer().write_to_memory().map_err(map_qpdf_error)
    }

    /// Extract a single page (0-indexed) as a standalone PDF.
    pub fn extract_page(input_data: &[u8], index: u32, password: Option<&str>) -> Result<Vec<u8>> {
        let source = open_qpdf(input_data, password)?;
        let num_pages = source.get_num_pages().map_err(map_qpdf_error)?;

        let page = source.get_page(index).ok_or_else(|| Error::Qpdf {
            reason: format!("Page {} out of bounds (total: {})", index + 1, num_pages),
        })?;

        let dest = QPdf::empty();
        let copied = dest.copy_from_foreign(&page);
        dest.add_page(&copied, false).map_err(map_qpdf_error)?;

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Encrypt a PDF with user and owner passwords.
    ///
    /// The privilege set mirrors the façade contract: printing and form
    /// filling stay allowed, everything else is forbidden. Cipher parameters
    /// (AES-256, R6) are the engine's modern default.
    pub fn encrypt(
        input_data: &[u8],
        user_password: &str,
        owner_password: Option<&str>,
    ) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, None)?;

        let owner_pwd = owner_password.unwrap_or(user_password);

        let encryption = EncryptionParams::R6(EncryptionParamsR6 {
            user_password: user_password.to_string(),
            owner_password: owner_pwd.to_string(),
            allow_accessibility: false,
            allow_extract: false,
            allow_assemble: false,
            allow_annotate_and_form: false,
            allow_form_filling: true,
            allow_modify_other: false,
            allow_print: PrintPermission::Full,
            encrypt_metadata: true,
        });

        let mut writer = qpdf.writer();
        writer
            .preserve_encryption(false)
            .encryption_params(encryption);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Decrypt a PDF (remove password protection).
    pub fn decrypt(input_data: &[u8], password: &str) -> Result<Vec<u8>> {
        let qpdf =
            QPdf::read_from_memory_encrypted(input_data, password).map_err(map_qpdf_error)?;

        let mut writer = qpdf.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Compress a PDF by optimizing streams and removing redundancy.
    pub fn compress(
        input_data: &[u8],
        password: Option<&str>,
        object_streams: Option<&str>,
    ) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, password)?;

        let os_mode = match object_streams.unwrap_or("generate") {
            "preserve" => ObjectStreamMode::Preserve,
            "disable" => ObjectStreamMode::Disable,
            _ => ObjectStreamMode::Generate,
        };

        let mut writer = qpdf.writer();
        writer
            .object_stream_mode(os_mode)
            .compress_streams(true)
            .normalize_content(true)
            .preserve_unreferenced_objects(false)
            .preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Rewrite a PDF through the engine's writer without changing content.
    pub fn rewrite(input_data: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, password)?;

        let mut writer = qpdf.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Produce a linearized (web-optimized) copy of a PDF.
    pub fn linearize(input_data: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
        let qpdf = open_qpdf(input_data, password)?;

        let mut writer = qpdf.writer();
        writer.preserve_encryption(false).linearize(true);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Get the page count of a PDF.
    pub fn page_count(input_data: &[u8], password: Option<&str>) -> Result<u32> {
        let qpdf = open_qpdf(input_data, password)?;
        qpdf.get_num_pages().map_err(map_qpdf_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_rejects_empty_input() {
        let result = QpdfEngine::merge(&[]);
        assert!(matches!(result, Err(Error::Qpdf { .. })));
    }
}
