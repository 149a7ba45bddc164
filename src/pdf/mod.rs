//! PDF engine layer
//!
//! All real PDF work is delegated here: qpdf for page assembly, security,
//! and compression; PDFium for text, rasterization, and forms; lopdf for
//! document object-model edits.

pub mod editor;
mod qpdf;
mod reader;

pub use editor::WatermarkStyle;
pub use qpdf::QpdfEngine;
pub use reader::{
    extract_all_text, flatten_forms, read_form_fields, render_pages, FormFieldKind,
    FormFieldSnapshot, FormOption, RenderedPage,
};
