//! Form edits: flattening and value extraction.

use crate::error::{Error, Result};
use crate::ops::OpOutcome;
use crate::pdf::{self, FormFieldKind, FormFieldSnapshot};
use crate::util;
use std::path::Path;

/// Flatten all form fields into static page content.
pub fn flatten_form_fields(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    flatten_inner(input, output)
        .map_err(|e| Error::forms(format!("Failed to flatten form fields in PDF: {}", e)))
}

fn flatten_inner(input: &Path, output: Option<&str>) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let flattened = pdf::flatten_forms(&data, None)?;

    let output = util::resolve_output_path(input, output, "flattenformfield", "pdf");
    util::ensure_parent_dir(&output)?;
    std::fs::write(&output, &flattened)?;

    Ok(OpOutcome::single(
        format!("Flattened form fields, saved to: {}", output.display()),
        output,
    ))
}

/// Read the current value of every form field into a text report.
pub fn get_form_values(input: &Path) -> Result<OpOutcome> {
    values_inner(input)
        .map_err(|e| Error::forms(format!("Failed to get form values: {}", e)))
}

fn values_inner(input: &Path) -> Result<OpOutcome> {
    let data = util::read_pdf_bytes(input)?;
    let fields = pdf::read_form_fields(&data, None)?;

    let lines = render_report(&fields);

    let output = util::derived_output_path(input, "getformsvalues", "txt");
    util::write_text_report(&output, &lines)?;

    Ok(OpOutcome::single(
        format!(
            "Wrote {} form field values to: {}",
            fields.len(),
            output.display()
        ),
        output,
    ))
}

fn render_report(fields: &[FormFieldSnapshot]) -> Vec<String> {
    let mut lines = Vec::new();

    for field in fields {
        let name = field.name.as_deref().unwrap_or("(unnamed)");
        match field.kind {
            FormFieldKind::Text => {
                lines.push(format!(
                    "The text in textbox {} is: {}",
                    name,
                    field.value.as_deref().unwrap_or("")
                ));
            }
            FormFieldKind::CheckBox => {
                lines.push(format!(
                    "The checkbox {} is checked: {}",
                    name,
                    field.checked.unwrap_or(false)
                ));
            }
            FormFieldKind::RadioButton => {
                lines.push(format!(
                    "The radio button {} is selected: {}",
                    name,
                    field.checked.unwrap_or(false)
                ));
            }
            FormFieldKind::ComboBox | FormFieldKind::ListBox => {
                let label = if field.kind == FormFieldKind::ComboBox {
                    "combobox"
                } else {
                    "listbox"
                };
                lines.push(format!("The {} {} items are:", label, name));
                for option in &field.options {
                    lines.push(format!("  {}", option.label.as_deref().unwrap_or("")));
                }
                let selected = field
                    .options
                    .iter()
                    .find(|option| option.is_selected)
                    .and_then(|option| option.label.as_deref())
                    .unwrap_or("(none)");
                lines.push(format!(
                    "The selected value in the {} {} is: {}",
                    label, name, selected
                ));
            }
            FormFieldKind::PushButton | FormFieldKind::Signature | FormFieldKind::Unknown => {}
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::FormOption;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flatten_missing_input_is_forms_error() {
        let result = flatten_form_fields(Path::new("/nonexistent/input.pdf"), None);
        assert!(matches!(result, Err(Error::Forms { .. })));
    }

    #[test]
    fn test_values_missing_input_is_forms_error() {
        let result = get_form_values(Path::new("/nonexistent/input.pdf"));
        assert!(matches!(result, Err(Error::Forms { .. })));
    }

    #[test]
    fn test_render_report_covers_field_kinds() {
        let fields = vec![
            FormFieldSnapshot {
                name: Some("applicant".to_string()),
                kind: FormFieldKind::Text,
                value: Some("Ada".to_string()),
                checked: None,
                options: vec![],
            },
            FormFieldSnapshot {
                name: Some("agree".to_string()),
                kind: FormFieldKind::CheckBox,
                value: None,
                checked: Some(true),
                options: vec![],
            },
            FormFieldSnapshot {
                name: Some("color".to_string()),
                kind: FormFieldKind::ComboBox,
                value: None,
                checked: None,
                options: vec![
                    FormOption {
                        label: Some("red".to_string()),
                        is_selected: false,
                    },
                    FormOption {
                        label: Some("blue".to_string()),
                        is_selected: true,
                    },
                ],
            },
        ];

        let lines = render_report(&fields);

        assert_eq!(lines[0], "The text in textbox applicant is: Ada");
        assert_eq!(lines[1], "The checkbox agree is checked: true");
        assert_eq!(lines[2], "The combobox color items are:");
        assert_eq!(lines[3], "  red");
        assert_eq!(lines[4], "  blue");
        assert_eq!(
            lines[5],
            "The selected value in the combobox color is: blue"
        );
    }

    #[test]
    fn test_render_report_skips_buttons() {
        let fields = vec![FormFieldSnapshot {
            name: Some("submit".to_string()),
            kind: FormFieldKind::PushButton,
            value: None,
            checked: None,
            options: vec![],
        }];
        assert!(render_report(&fields).is_empty());
    }
}
