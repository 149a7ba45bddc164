//! Format conversion.
//!
//! The supported target set is whatever the engine stack can produce:
//! a plain rewrite, a linearized (web-optimized) copy, or one PNG per page.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::{self, QpdfEngine};
use crate::util;
use std::path::Path;

const DEFAULT_IMAGE_WIDTH: i32 = 1200;

/// Conversion targets supported by the engine stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFormat {
    /// Rewrite through the engine's writer
    Pdf,
    /// Linearized (web-optimized) PDF
    Linearized,
    /// One PNG image per page
    Image,
}

impl ConvertFormat {
    pub fn parse(format_type: &str) -> Result<Self> {
        match format_type.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ConvertFormat::Pdf),
            "linearized" | "linearizedpdf" => Ok(ConvertFormat::Linearized),
            "image" | "png" => Ok(ConvertFormat::Image),
            other => Err(Error::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ConvertFormat::Pdf => "pdf",
            ConvertFormat::Linearized => "linearized",
            ConvertFormat::Image => "image",
        }
    }
}

/// Convert a document to the requested format.
pub fn convert_document(
    input: &Path,
    output: Option<&str>,
    format_type: &str,
) -> Result<OpOutcome> {
    convert_inner(input, output, format_type)
        .map_err(|e| Error::conversion(format!("Failed to convert PDF document: {}", e)))
}

fn convert_inner(input: &Path, output: Option<&str>, format_type: &str) -> Result<OpOutcome> {
    let format = ConvertFormat::parse(format_type)?;
    let data = util::read_pdf_bytes(input)?;

    match format {
        ConvertFormat::Pdf | ConvertFormat::Linearized => {
            let converted = match format {
                ConvertFormat::Pdf => QpdfEngine::rewrite(&data, None)?,
                _ => QpdfEngine::linearize(&data, None)?,
            };

            let output = util::resolve_output_path(input, output, format.suffix(), "pdf");
            util::ensure_parent_dir(&output)?;
            std::fs::write(&output, &converted)?;

            Ok(OpOutcome::single(
                format!(
                    "Converted PDF to {}: {}",
                    format.suffix(),
                    output.display()
                ),
                output,
            ))
        }
        ConvertFormat::Image => {
            // Explicit output names the directory the page images land in.
            let directory = match output {
                Some(path) => util::resolve_output_path(input, Some(path), "image", "pdf")
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| Path::new(".").to_path_buf()),
                None => input
                    .parent()
                    .filter(|parent| !parent.as_os_str().is_empty())
                    .unwrap_or(Path::new("."))
                    .to_path_buf(),
            };
            std::fs::create_dir_all(&directory)?;

            let rendered = pdf::render_pages(&data, None, DEFAULT_IMAGE_WIDTH)?;
            let mut outputs = Vec::with_capacity(rendered.len());
            for page in &rendered {
                let out = directory.join(format!("page-{}.png", page.page));
                std::fs::write(&out, &page.png)?;
                outputs.push(out);
            }

            Ok(OpOutcome {
                message: format!(
                    "Converted {} pages to PNG images in: {}",
                    rendered.len(),
                    directory.display()
                ),
                outputs,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_formats() {
        assert_eq!(ConvertFormat::parse("pdf").unwrap(), ConvertFormat::Pdf);
        assert_eq!(
            ConvertFormat::parse("Linearized").unwrap(),
            ConvertFormat::Linearized
        );
        assert_eq!(
            ConvertFormat::parse("linearizedpdf").unwrap(),
            ConvertFormat::Linearized
        );
        assert_eq!(ConvertFormat::parse("image").unwrap(), ConvertFormat::Image);
        assert_eq!(ConvertFormat::parse("PNG").unwrap(), ConvertFormat::Image);
    }

    #[test]
    fn test_parse_unknown_format() {
        let result = ConvertFormat::parse("docx");
        assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_unknown_format_surfaces_as_conversion_error() {
        let result = convert_document(Path::new("/nonexistent/input.pdf"), None, "docx");
        assert!(matches!(result, Err(Error::Conversion { .. })));
    }

    #[test]
    fn test_missing_input_is_conversion_error() {
        let result = convert_document(Path::new("/nonexistent/input.pdf"), None, "pdf");
        assert!(matches!(result, Err(Error::Conversion { .. })));
    }
}
