//! Error types for the PDF edit MCP server

use thiserror::Error;

/// Result type alias for the PDF edit MCP server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF edit MCP server.
///
/// Every core operation re-wraps whatever went wrong into the variant for its
/// feature area, carrying the underlying message. The tool layer turns that
/// variant into the `"Error: ..."` string returned to the client. The
/// remaining variants are produced by the engine adapters and the utility
/// layer before an operation wraps them.
#[derive(Error, Debug)]
pub enum Error {
    /// Document lifecycle operation failed (create, extract, merge,
    /// watermark, compress, split)
    #[error("{reason}")]
    Document { reason: String },

    /// Format conversion failed
    #[error("{reason}")]
    Conversion { reason: String },

    /// Encryption or decryption failed
    #[error("{reason}")]
    Security { reason: String },

    /// Text replacement failed
    #[error("{reason}")]
    Text { reason: String },

    /// Bookmark edit failed
    #[error("{reason}")]
    Bookmarks { reason: String },

    /// Form edit failed
    #[error("{reason}")]
    Forms { reason: String },

    /// Attachment edit failed
    #[error("{reason}")]
    Attachments { reason: String },

    /// Utility helper failed (path or report writing)
    #[error("{reason}")]
    Utility { reason: String },

    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Incorrect password provided
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Unsupported conversion format
    #[error("Unsupported format type: {format}")]
    UnsupportedFormat { format: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// qpdf error
    #[error("qpdf error: {reason}")]
    Qpdf { reason: String },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// lopdf error
    #[error("PDF object error: {reason}")]
    Lopdf { reason: String },
}

impl Error {
    pub fn document(reason: impl Into<String>) -> Self {
        Error::Document {
            reason: reason.into(),
        }
    }

    pub fn conversion(reason: impl Into<String>) -> Self {
        Error::Conversion {
            reason: reason.into(),
        }
    }

    pub fn security(reason: impl Into<String>) -> Self {
        Error::Security {
            reason: reason.into(),
        }
    }

    pub fn text(reason: impl Into<String>) -> Self {
        Error::Text {
            reason: reason.into(),
        }
    }

    pub fn bookmarks(reason: impl Into<String>) -> Self {
        Error::Bookmarks {
            reason: reason.into(),
        }
    }

    pub fn forms(reason: impl Into<String>) -> Self {
        Error::Forms {
            reason: reason.into(),
        }
    }

    pub fn attachments(reason: impl Into<String>) -> Self {
        Error::Attachments {
            reason: reason.into(),
        }
    }

    pub fn utility(reason: impl Into<String>) -> Self {
        Error::Utility {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_errors_carry_the_original_message() {
        let err = Error::document("Failed to merge PDFs: PDF not found: a.pdf");
        assert_eq!(
            err.to_string(),
            "Failed to merge PDFs: PDF not found: a.pdf"
        );
    }

    #[test]
    fn infra_errors_name_their_source() {
        let err = Error::PdfNotFound {
            path: "/tmp/missing.pdf".to_string(),
        };
        assert_eq!(err.to_string(), "PDF not found: /tmp/missing.pdf");

        let err = Error::Qpdf {
            reason: "bad xref".to_string(),
        };
        assert_eq!(err.to_string(), "qpdf error: bad xref");
    }
}
