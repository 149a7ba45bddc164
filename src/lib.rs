//! PDF Edit MCP Server Library
//!
//! This crate provides MCP tools for PDF manipulation:
//! - `create_document` / `convert_document` / `extract_text`
//! - `merge_documents` / `split_document` / `compress_document`
//! - `add_text_watermark` / `replace_all_text`
//! - `encrypt_document` / `decrypt_document`
//! - `delete_all_bookmarks` / `expand_bookmarks`
//! - `flatten_form_fields` / `get_form_values` / `delete_all_attachments`
//!
//! All real PDF work is delegated to the engine layer in [`pdf`]; the tools
//! are thin façades that resolve paths, invoke the engine, and report where
//! the output landed.

pub mod config;
pub mod error;
pub mod ops;
pub mod pdf;
pub mod server;
pub mod util;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use server::{run_server, run_server_with_config, PdfServer};
