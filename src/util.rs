//! Path and file helpers shared by the core operations

use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resolve a client-supplied file path against the configured base directory.
/// Absolute paths pass through unchanged.
pub fn resolve_path(base_dir: &Path, filepath: &str) -> PathBuf {
    let path = Path::new(filepath);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Build the conventional derived output path `<stem>-<suffix>.<ext>` as a
/// sibling of the input.
pub fn derived_output_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    parent_dir(input).join(format!("{}-{}.{}", stem, suffix, ext))
}

/// Build a sibling path with the same stem and a different extension
/// (`report.pdf` -> `report.txt`).
pub fn sibling_path(input: &Path, ext: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    parent_dir(input).join(format!("{}.{}", stem, ext))
}

/// Resolve an optional explicit output path, falling back to the derived
/// `<stem>-<suffix>.<ext>` convention. Explicit relative paths resolve
/// against the input's directory.
pub fn resolve_output_path(
    input: &Path,
    explicit: Option<&str>,
    suffix: &str,
    ext: &str,
) -> PathBuf {
    match explicit {
        Some(path) => {
            let path = Path::new(path);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                parent_dir(input).join(path)
            }
        }
        None => derived_output_path(input, suffix, ext),
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Create the destination directory for an output path if it does not exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Verify the destination directory accepts writes before engine work starts.
pub fn ensure_writable_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir)?;
    if metadata.permissions().readonly() {
        return Err(Error::utility(format!(
            "no write access: {}",
            dir.display()
        )));
    }
    Ok(())
}

/// Read a PDF file into memory, validating existence and the `%PDF` header.
pub fn read_pdf_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(Error::Io)?;

    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }

    Ok(data)
}

/// Write extracted lines to a text report, one per line, creating the
/// destination directory as needed.
pub fn write_text_report(path: &Path, lines: &[String]) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| Error::utility(format!("Text write failure: {}", e)))?;
    for line in lines {
        writeln!(file, "{}", line)
            .map_err(|e| Error::utility(format!("Text write failure: {}", e)))?;
    }

    Ok(())
}
