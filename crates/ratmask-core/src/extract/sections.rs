//! Per-block extractors driven by the template table.

use tracing::trace;

use super::locator::{read_checkbox, read_field};
use super::template::{PageRole, TemplateLayout};
use crate::models::fields::FieldMap;
use crate::pdf::PdfPage;

/// Ticket number, falling back to the circuit designation.
///
/// Label groups are tried in order; the first non-empty digit run wins.
pub fn extract_call_number(page: &PdfPage, layout: &TemplateLayout, line_tolerance: f32) -> String {
    layout
        .call_number
        .iter()
        .map(|group| read_field(page, group, line_tolerance))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Identification block of page 1: technician, acknowledger, contact,
/// acceptance and the final-test checkbox.
pub fn extract_identification(
    page: &PdfPage,
    layout: &TemplateLayout,
    line_tolerance: f32,
    fields: &mut FieldMap,
) {
    for field in layout.fields_on(PageRole::Identification) {
        let value = read_field(page, field, line_tolerance);
        fields.append(&field.key, &value);
    }

    for checkbox in layout.checkboxes_on(PageRole::Identification) {
        match read_checkbox(page, checkbox) {
            Some(flag) => fields.append(&checkbox.key, flag.as_str()),
            None => {
                trace!("No mark found for {}", checkbox.key);
                fields.append(&checkbox.key, "");
            }
        }
    }
}

/// Free-text blocks of page 2: observations, problem found and corrective
/// action, each read from a fixed-height area under its heading.
pub fn extract_free_text(
    page: &PdfPage,
    layout: &TemplateLayout,
    line_tolerance: f32,
    fields: &mut FieldMap,
) {
    for field in layout.fields_on(PageRole::Report) {
        let value = read_field(page, field, line_tolerance);
        fields.append(&field.key, &value);
    }

    for checkbox in layout.checkboxes_on(PageRole::Report) {
        let value = read_checkbox(page, checkbox).map(|f| f.as_str()).unwrap_or("");
        fields.append(&checkbox.key, value);
    }
}
