//! PDFium adapter for text extraction, rasterization, and form handling

use crate::error::{Error, Result};
use pdfium_render::prelude::*;

/// A page rasterized to a PNG image
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Page number (1-indexed)
    pub page: u32,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// PNG-encoded image data
    pub png: Vec<u8>,
}

/// Form field kind as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFieldKind {
    Text,
    CheckBox,
    RadioButton,
    ComboBox,
    ListBox,
    PushButton,
    Signature,
    Unknown,
}

/// One selectable option of a combo/list box
#[derive(Debug, Clone)]
pub struct FormOption {
    pub label: Option<String>,
    pub is_selected: bool,
}

/// Snapshot of a form field's current state
#[derive(Debug, Clone)]
pub struct FormFieldSnapshot {
    pub name: Option<String>,
    pub kind: FormFieldKind,
    /// Current value (text fields)
    pub value: Option<String>,
    /// Checked state (checkbox/radio fields)
    pub checked: Option<bool>,
    /// Options with selection state (combo/list boxes)
    pub options: Vec<FormOption>,
}

fn create_pdfium() -> Result<Pdfium> {
    // Try to bind to system library or use static linking
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

fn map_pdfium_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::PasswordRequired
        }
        other => Error::Pdfium {
            reason: format!("{}", other),
        },
    }
}

fn validate_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    data: &'a [u8],
    password: Option<&str>,
) -> Result<PdfDocument<'a>> {
    pdfium
        .load_pdf_from_byte_slice(data, password)
        .map_err(map_pdfium_error)
}

/// Extract the text of every page, in order.
pub fn extract_all_text(data: &[u8], password: Option<&str>) -> Result<Vec<String>> {
    validate_header(data)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;

    let pages = document.pages();
    let mut texts = Vec::with_capacity(pages.len() as usize);

    for index in 0..pages.len() {
        let page = pages.get(index).map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", index + 1, e),
        })?;
        let text = page.text().map_err(|e| Error::Pdfium {
            reason: format!("Failed to read text on page {}: {}", index + 1, e),
        })?;
        texts.push(text.all());
    }

    Ok(texts)
}

/// Rasterize every page to a PNG image at the given target width.
pub fn render_pages(
    data: &[u8],
    password: Option<&str>,
    target_width: i32,
) -> Result<Vec<RenderedPage>> {
    validate_header(data)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;

    let pages = document.pages();
    let mut rendered = Vec::with_capacity(pages.len() as usize);

    let config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .render_form_data(true)
        .render_annotations(true);

    for index in 0..pages.len() {
        let page_num = index as u32 + 1;
        let page = pages.get(index).map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", page_num, e),
        })?;

        let bitmap = page.render_with_config(&config).map_err(|e| Error::Pdfium {
            reason: format!("Failed to render page {}: {}", page_num, e),
        })?;

        let dynamic_image = bitmap.as_image();
        let img_width = dynamic_image.width();
        let img_height = dynamic_image.height();

        let mut png_bytes = Vec::new();
        dynamic_image
            .write_to(
                &mut std::io::Cursor::new(&mut png_bytes),
                image::ImageFormat::Png,
            )
            .map_err(|e| Error::Pdfium {
                reason: format!("Failed to encode page {} as PNG: {}", page_num, e),
            })?;

        rendered.push(RenderedPage {
            page: page_num,
            width: img_width,
            height: img_height,
            png: png_bytes,
        });
    }

    Ok(rendered)
}

/// Read the current state of every form field in the document.
pub fn read_form_fields(data: &[u8], password: Option<&str>) -> Result<Vec<FormFieldSnapshot>> {
    validate_header(data)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;

    let mut fields = Vec::new();
    let pages = document.pages();

    for index in 0..pages.len() {
        let page = pages.get(index).map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", index + 1, e),
        })?;

        for annotation in page.annotations().iter() {
            if let Some(field) = annotation.as_form_field() {
                let mut snapshot = FormFieldSnapshot {
                    name: field.name(),
                    kind: FormFieldKind::Unknown,
                    value: None,
                    checked: None,
                    options: Vec::new(),
                };

                if let Some(text_field) = field.as_text_field() {
                    snapshot.kind = FormFieldKind::Text;
                    snapshot.value = text_field.value();
                } else if let Some(checkbox) = field.as_checkbox_field() {
                    snapshot.kind = FormFieldKind::CheckBox;
                    snapshot.checked = checkbox.is_checked().ok();
                } else if let Some(radio) = field.as_radio_button_field() {
                    snapshot.kind = FormFieldKind::RadioButton;
                    snapshot.checked = radio.is_checked().ok();
                } else if let Some(combo) = field.as_combo_box_field() {
                    snapshot.kind = FormFieldKind::ComboBox;
                    for i in 0..combo.options().len() {
                        if let Ok(opt) = combo.options().get(i) {
                            snapshot.options.push(FormOption {
                                label: opt.label().cloned(),
                                is_selected: opt.is_set(),
                            });
                        }
                    }
                } else if let Some(list) = field.as_list_box_field() {
                    snapshot.kind = FormFieldKind::ListBox;
                    for i in 0..list.options().len() {
                        if let Ok(opt) = list.options().get(i) {
                            snapshot.options.push(FormOption {
                                label: opt.label().cloned(),
                                is_selected: opt.is_set(),
                            });
                        }
                    }
                } else if field.as_push_button_field().is_some() {
                    snapshot.kind = FormFieldKind::PushButton;
                } else if field.as_signature_field().is_some() {
                    snapshot.kind = FormFieldKind::Signature;
                }

                fields.push(snapshot);
            }
        }
    }

    Ok(fields)
}

/// Flatten form fields and annotations into static page content and return
/// the modified PDF bytes.
pub fn flatten_forms(data: &[u8], password: Option<&str>) -> Result<Vec<u8>> {
    validate_header(data)?;
    let pdfium = create_pdfium()?;
    let document = load_document(&pdfium, data, password)?;

    let pages = document.pages();

    for index in 0..pages.len() {
        let mut page = pages.get(index).map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", index + 1, e),
        })?;
        page.flatten().map_err(|e| Error::Pdfium {
            reason: format!("Failed to flatten page {}: {}", index + 1, e),
        })?;
    }

    document.save_to_bytes().map_err(|e| Error::Pdfium {
        reason: format!("Failed to save flattened PDF: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_header_detected_before_engine_init() {
        // Header validation runs before PDFium is loaded, so this fails with
        // InvalidPdf even on hosts without the library.
        let result = extract_all_text(b"not a pdf", None);
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }
}
