//! Server configuration

use std::path::PathBuf;

/// Environment variable selecting the base directory for relative file paths.
pub const PDF_FILES_PATH_ENV: &str = "PDF_FILES_PATH";

const DEFAULT_PDF_FILES_PATH: &str = "./pdf_files";

/// Configuration for the PDF edit MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory that relative file paths are resolved against
    pub base_dir: PathBuf,
}

impl ServerConfig {
    /// Build configuration from the environment (`PDF_FILES_PATH`)
    pub fn from_env() -> Self {
        let base_dir = std::env::var(PDF_FILES_PATH_ENV)
            .unwrap_or_else(|_| DEFAULT_PDF_FILES_PATH.to_string());
        Self {
            base_dir: PathBuf::from(base_dir),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_PDF_FILES_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_dir() {
        let config = ServerConfig::default();
        assert_eq!(config.base_dir, PathBuf::from("./pdf_files"));
    }
}
