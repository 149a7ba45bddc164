//! MCP server implementation using rmcp
//!
//! One tool per PDF operation. Every tool resolves its file paths against
//! the configured base directory, runs the core operation on the blocking
//! thread pool, and returns the status message as a plain string. Errors are
//! logged and surfaced as `"Error: ..."` strings, never as protocol faults.

use crate::config::ServerConfig;
use crate::ops;
use crate::pdf::WatermarkStyle;
use crate::util;
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Open-ended per-operation options, accepted for compatibility.
/// Only `add_text_watermark` and `compress_document` read any keys.
type OpOptions = Option<HashMap<String, serde_json::Value>>;

/// PDF edit MCP server
#[derive(Clone)]
pub struct PdfServer {
    config: Arc<ServerConfig>,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDocumentParams {
    /// Path where the new document will be saved
    pub filepath: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertDocumentParams {
    /// Path to the source PDF file
    pub filepath: String,
    /// Target format: "pdf", "linearized", or "image" (PNG per page)
    pub format_type: String,
    /// Output path; defaults to `<stem>-<format>.pdf` next to the input.
    /// For "image", names a file inside the target directory for the
    /// per-page PNG files.
    #[serde(default)]
    pub output_path: Option<String>,
    /// Format-specific options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractTextParams {
    /// Path to the PDF file
    pub filepath: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergeDocumentsParams {
    /// Paths of the PDF files to merge, in order
    pub filepaths: Vec<String>,
    /// Output path; defaults to `<first-stem>-merge.pdf` next to the first input
    #[serde(default)]
    pub output_path: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTextWatermarkParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Text content of the watermark
    pub watermark_text: String,
    /// Output path; defaults to `<stem>-watermark.pdf` next to the input
    #[serde(default)]
    pub output_path: Option<String>,
    /// Watermark options: "font_size" (default 24), "opacity" (0.0-1.0,
    /// default 0.3), "rotation" in degrees (default 45)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompressDocumentParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Output path; defaults to `<stem>-compress.pdf` next to the input
    #[serde(default)]
    pub output_path: Option<String>,
    /// Compression options: "object_streams" = "generate" (default),
    /// "preserve", or "disable"
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SplitDocumentParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EncryptDocumentParams {
    /// Path to the PDF file
    pub input_path: String,
    /// User password (required to open the PDF)
    pub user_password: String,
    /// Owner password (required to change permissions). Defaults to the
    /// user password.
    #[serde(default)]
    pub owner_password: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DecryptDocumentParams {
    /// Path to the encrypted PDF file
    pub input_path: String,
    /// Password for the PDF
    pub password: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReplaceAllTextParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Text to be replaced
    pub old_text: String,
    /// Replacement text
    pub new_text: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteAllBookmarksParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Output path; defaults to `<stem>-deleteallbookmarks.pdf`
    #[serde(default)]
    pub output_path: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExpandBookmarksParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Output path; defaults to `<stem>-expandbookmarks.pdf`
    #[serde(default)]
    pub output_path: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FlattenFormFieldsParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Output path; defaults to `<stem>-flattenformfield.pdf`
    #[serde(default)]
    pub output_path: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFormValuesParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteAllAttachmentsParams {
    /// Path to the PDF file
    pub input_path: String,
    /// Output path; defaults to `<stem>-deleteallattachments.pdf`
    #[serde(default)]
    pub output_path: Option<String>,
    /// Operation options (accepted, unused)
    #[serde(default)]
    pub options: OpOptions,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with the given configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    /// Create a new blank PDF document
    #[tool(
        description = "Create a new single-page PDF document at the given path. Relative paths are resolved against the configured PDF files directory."
    )]
    async fn create_document(
        &self,
        Parameters(params): Parameters<CreateDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.filepath);
        self.run(move || ops::document::create_document(&path)).await
    }

    /// Convert a PDF to a different format
    #[tool(
        description = "Convert a PDF file to a different format.

Supported formats:
- pdf: rewrite the document through the engine
- linearized: produce a web-optimized (linearized) copy
- image: render each page to a PNG file (page-<n>.png)"
    )]
    async fn convert_document(
        &self,
        Parameters(params): Parameters<ConvertDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.filepath);
        let output = params.output_path.clone();
        let format_type = params.format_type.clone();
        self.run(move || {
            ops::conversion::convert_document(&path, output.as_deref(), &format_type)
        })
        .await
    }

    /// Extract text from every page of a PDF
    #[tool(
        description = "Extract the text of every page to a sibling <stem>.txt file next to the input."
    )]
    async fn extract_text(&self, Parameters(params): Parameters<ExtractTextParams>) -> String {
        let path = self.resolve(&params.filepath);
        self.run(move || ops::document::extract_text(&path)).await
    }

    /// Merge multiple PDF files into one
    #[tool(
        description = "Merge multiple PDF files into a single PDF, in the order given. Inputs that cannot be read are logged and skipped; the merge proceeds with the rest."
    )]
    async fn merge_documents(
        &self,
        Parameters(params): Parameters<MergeDocumentsParams>,
    ) -> String {
        let inputs: Vec<PathBuf> = params
            .filepaths
            .iter()
            .map(|filepath| self.resolve(filepath))
            .collect();

        let output = match inputs.first() {
            Some(first) => util::resolve_output_path(
                first,
                params.output_path.as_deref(),
                "merge",
                "pdf",
            ),
            None => {
                tracing::warn!("merge_documents called with no inputs");
                return "Error: No input PDFs provided".to_string();
            }
        };

        self.run(move || ops::document::merge_documents(&inputs, &output))
            .await
    }

    /// Add a text watermark to a PDF
    #[tool(
        description = "Add a tiled, rotated text watermark to every page of a PDF.

Options (all optional): font_size (default 24), opacity (0.0-1.0, default 0.3), rotation in degrees (default 45)."
    )]
    async fn add_text_watermark(
        &self,
        Parameters(params): Parameters<AddTextWatermarkParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        let text = params.watermark_text.clone();
        let style = watermark_style(params.options.as_ref());
        self.run(move || {
            ops::document::add_text_watermark(&path, output.as_deref(), &text, &style)
        })
        .await
    }

    /// Compress a PDF to reduce file size
    #[tool(
        description = "Compress a PDF file using stream optimization and object deduplication.

Options: object_streams = \"generate\" (default), \"preserve\", or \"disable\"."
    )]
    async fn compress_document(
        &self,
        Parameters(params): Parameters<CompressDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        let object_streams = params
            .options
            .as_ref()
            .and_then(|options| options.get("object_streams"))
            .and_then(|value| value.as_str())
            .map(String::from);
        self.run(move || {
            ops::document::compress_document(&path, output.as_deref(), object_streams.as_deref())
        })
        .await
    }

    /// Split a PDF into one file per page
    #[tool(
        description = "Split a PDF into one file per page. Pages are written as <stem>-<i>.pdf next to the input, i counting from 0; the source file is never overwritten."
    )]
    async fn split_document(
        &self,
        Parameters(params): Parameters<SplitDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        self.run(move || ops::document::split_document(&path)).await
    }

    /// Encrypt a PDF with password protection
    #[tool(
        description = "Encrypt a PDF with user and owner passwords. Printing and form filling stay allowed, all other privileges are forbidden. Output is <stem>-encrypt.pdf."
    )]
    async fn encrypt_document(
        &self,
        Parameters(params): Parameters<EncryptDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let user_password = params.user_password.clone();
        let owner_password = params.owner_password.clone();
        self.run(move || {
            ops::security::encrypt_document(&path, &user_password, owner_password.as_deref())
        })
        .await
    }

    /// Remove password protection from a PDF
    #[tool(
        description = "Decrypt a password-protected PDF. Requires the correct password. Output is <stem>-decrypt.pdf, loadable without a password."
    )]
    async fn decrypt_document(
        &self,
        Parameters(params): Parameters<DecryptDocumentParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let password = params.password.clone();
        self.run(move || ops::security::decrypt_document(&path, &password))
            .await
    }

    /// Replace text throughout a PDF
    #[tool(
        description = "Replace every occurrence of a text string across all pages. Output is <stem>-replacetext.pdf."
    )]
    async fn replace_all_text(
        &self,
        Parameters(params): Parameters<ReplaceAllTextParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let old_text = params.old_text.clone();
        let new_text = params.new_text.clone();
        self.run(move || ops::text::replace_all_text(&path, &old_text, &new_text))
            .await
    }

    /// Delete all bookmarks from a PDF
    #[tool(
        description = "Remove the entire bookmark tree from a PDF. Output is <stem>-deleteallbookmarks.pdf."
    )]
    async fn delete_all_bookmarks(
        &self,
        Parameters(params): Parameters<DeleteAllBookmarksParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        self.run(move || ops::bookmarks::delete_all_bookmarks(&path, output.as_deref()))
            .await
    }

    /// Expand all bookmarks in a PDF
    #[tool(
        description = "Open every bookmark node so viewers show the outline expanded. Output is <stem>-expandbookmarks.pdf."
    )]
    async fn expand_bookmarks(
        &self,
        Parameters(params): Parameters<ExpandBookmarksParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        self.run(move || ops::bookmarks::expand_bookmarks(&path, output.as_deref()))
            .await
    }

    /// Flatten form fields in a PDF
    #[tool(
        description = "Flatten all form fields into static page content. Output is <stem>-flattenformfield.pdf."
    )]
    async fn flatten_form_fields(
        &self,
        Parameters(params): Parameters<FlattenFormFieldsParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        self.run(move || ops::forms::flatten_form_fields(&path, output.as_deref()))
            .await
    }

    /// Read form field values from a PDF
    #[tool(
        description = "Read the current value of every form field into a text report. Output is <stem>-getformsvalues.txt."
    )]
    async fn get_form_values(
        &self,
        Parameters(params): Parameters<GetFormValuesParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        self.run(move || ops::forms::get_form_values(&path)).await
    }

    /// Delete all attachments from a PDF
    #[tool(
        description = "Remove every document-level attachment from a PDF. Output is <stem>-deleteallattachments.pdf."
    )]
    async fn delete_all_attachments(
        &self,
        Parameters(params): Parameters<DeleteAllAttachmentsParams>,
    ) -> String {
        let path = self.resolve(&params.input_path);
        let output = params.output_path.clone();
        self.run(move || ops::attachments::delete_all_attachments(&path, output.as_deref()))
            .await
    }
}

impl PdfServer {
    fn resolve(&self, filepath: &str) -> PathBuf {
        util::resolve_path(&self.config.base_dir, filepath)
    }

    /// Run a core operation on the blocking thread pool and map the outcome
    /// to the string returned to the client.
    async fn run<F>(&self, op: F) -> String
    where
        F: FnOnce() -> crate::error::Result<ops::OpOutcome> + Send + 'static,
    {
        match tokio::task::spawn_blocking(op).await {
            Ok(Ok(outcome)) => outcome.message,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "operation failed");
                format!("Error: {}", e)
            }
            Err(e) => {
                tracing::error!(error = %e, "operation task failed");
                format!("Error: {}", e)
            }
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn watermark_style(options: Option<&HashMap<String, serde_json::Value>>) -> WatermarkStyle {
    let mut style = WatermarkStyle::default();
    if let Some(options) = options {
        if let Some(value) = options.get("font_size").and_then(|value| value.as_f64()) {
            style.font_size = value;
        }
        if let Some(value) = options.get("opacity").and_then(|value| value.as_f64()) {
            style.opacity = value.clamp(0.0, 1.0);
        }
        if let Some(value) = options.get("rotation").and_then(|value| value.as_f64()) {
            style.rotation_degrees = value;
        }
    }
    style
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF edit MCP server provides tools for converting, merging, watermarking, \
                 compressing, splitting, encrypting, and editing PDF files. Relative file \
                 paths are resolved against the directory configured via PDF_FILES_PATH."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with configuration from the environment
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::from_env()).await
}

/// Run the MCP server with the given configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    tracing::info!(
        base_dir = %config.base_dir.display(),
        "PDF edit MCP server ready, waiting for connections..."
    );

    let server = PdfServer::with_config(config);
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
