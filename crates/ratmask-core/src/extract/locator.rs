//! Label-anchored value lookup on a page.

use std::cmp::Ordering;

use tracing::trace;

use super::normalize::{clean, clean_block, digits_or_clean, first_digit_run};
use super::template::{CheckboxDescriptor, FieldDescriptor, ReadStrategy, Region};
use crate::models::fields::TestFlag;
use crate::pdf::{PdfPage, Rect, Word};

/// First rectangle matching any of the label variants, tried in order.
pub fn find_label<S: AsRef<str>>(page: &PdfPage, labels: &[S]) -> Option<Rect> {
    labels
        .iter()
        .find_map(|label| page.search_for(label.as_ref()).into_iter().next())
}

/// Raw text of `region` relative to the first matching label.
pub fn read_region<S: AsRef<str>>(page: &PdfPage, labels: &[S], region: &Region) -> Option<String> {
    let anchor = find_label(page, labels)?;
    Some(page.text_in(&region.resolve(&anchor)))
}

/// Read and normalize a descriptor's value. Missing labels yield "".
pub fn read_field(page: &PdfPage, field: &FieldDescriptor, line_tolerance: f32) -> String {
    let Some(anchor) = find_label(page, &field.labels) else {
        trace!("Label not found for {} on page {}", field.key, page.number);
        return String::new();
    };
    let rect = field.region.resolve(&anchor);

    match field.strategy {
        ReadStrategy::Text => clean(&page.text_in(&rect)),
        ReadStrategy::FirstDigitRun => first_digit_run(&page.text_in(&rect)),
        ReadStrategy::DigitsOrClean => digits_or_clean(&page.text_in(&rect)),
        ReadStrategy::Block => clean_block(&page.lines_in(&rect, line_tolerance).join("\n")),
    }
}

/// Nearest word whose center lies within `radius` of `point`.
///
/// Ties on distance keep content-stream order.
pub fn nearest_word(page: &PdfPage, point: (f32, f32), radius: f32) -> Option<&Word> {
    let limit = radius * radius;
    let mut candidates: Vec<(f32, &Word)> = page
        .words()
        .iter()
        .map(|w| (w.rect.center_distance_sq(point), w))
        .filter(|(d, _)| *d <= limit)
        .collect();
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    candidates.into_iter().next().map(|(_, w)| w)
}

/// Which of the three checkbox positions carries an "X" mark.
pub fn read_checkbox(page: &PdfPage, checkbox: &CheckboxDescriptor) -> Option<TestFlag> {
    let anchor = find_label(page, &checkbox.labels)?;
    let (_, cy) = anchor.center();
    let y = cy + checkbox.dy;

    let candidates = [
        (TestFlag::Sim, checkbox.offsets.sim),
        (TestFlag::Nao, checkbox.offsets.nao),
        (TestFlag::NotApplicable, checkbox.offsets.na),
    ];

    candidates.into_iter().find_map(|(flag, dx)| {
        let word = nearest_word(page, (anchor.x1 + dx, y), checkbox.radius)?;
        word.text.eq_ignore_ascii_case("x").then_some(flag)
    })
}
