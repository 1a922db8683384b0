//! Client equipment block: first equipment entry of the list.
//!
//! Structured rows (`Tipo: X | S/N: Y | Mod: Z | Status: W`) are tried on
//! every page first; only when no page has one is the free-form area under
//! the heading scanned with the model/status lexicons and the serial
//! heuristics.

use regex::Regex;
use tracing::{debug, trace};

use super::locator::find_label;
use super::normalize::{clean, fold_accents};
use super::patterns::{ROW_MODEL, ROW_SERIAL, ROW_STATUS, ROW_TYPE, SERIAL_LABELED};
use super::template::EquipmentLayout;
use crate::models::fields::EquipmentRecord;
use crate::pdf::{PdfPage, Rect};

/// Minimum length of a serial number candidate.
const MIN_SERIAL_LEN: usize = 6;

/// Whether `candidate` can be a serial number.
///
/// At least six characters, at least one digit, no pipe, and not one of the
/// structural words in `stoplist` (compared case- and accent-insensitively).
pub fn looks_like_serial<S: AsRef<str>>(candidate: &str, stoplist: &[S]) -> bool {
    let candidate = candidate.trim();
    if candidate.chars().count() < MIN_SERIAL_LEN || candidate.contains('|') {
        return false;
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let folded = fold_accents(candidate).to_uppercase();
    !stoplist
        .iter()
        .any(|stop| fold_accents(stop.as_ref()).to_uppercase() == folded)
}

/// Parse one row band into sub-fields.
///
/// Returns `None` when the text has no recognizable tag, or when tags are
/// present but every sub-field is empty (a malformed row).
pub fn parse_row<S: AsRef<str>>(text: &str, stoplist: &[S]) -> Option<EquipmentRecord> {
    let tagged = [&*ROW_TYPE, &*ROW_SERIAL, &*ROW_MODEL, &*ROW_STATUS]
        .iter()
        .any(|rx| rx.is_match(text));
    if !tagged {
        return None;
    }

    let serial = capture(&ROW_SERIAL, text);
    let serial = if looks_like_serial(&serial, stoplist) {
        serial
    } else {
        if !serial.is_empty() {
            trace!("Rejected serial candidate {:?}", serial);
        }
        String::new()
    };

    let record = EquipmentRecord {
        kind: capture(&ROW_TYPE, text),
        serial,
        model: capture(&ROW_MODEL, text),
        status: capture(&ROW_STATUS, text),
    };

    if record.is_empty() {
        trace!("Skipping malformed equipment row: {:?}", text);
        None
    } else {
        Some(record)
    }
}

fn capture(rx: &Regex, text: &str) -> String {
    rx.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean(m.as_str()))
        .unwrap_or_default()
}

/// Free-form scan of the area under the heading.
pub fn scan_area(text: &str, layout: &EquipmentLayout) -> EquipmentRecord {
    EquipmentRecord {
        kind: String::new(),
        serial: find_serial(text, &layout.serial_stoplist),
        model: find_model(text, &layout.model_lexicon),
        status: find_status(text, &layout.status_lexicon),
    }
}

/// Model keyword from the lexicon, with the following token when it carries
/// a digit ("Cisco 1941").
fn find_model(text: &str, lexicon: &[String]) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        let bare = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
        let Some(keyword) = lexicon.iter().find(|k| k.eq_ignore_ascii_case(bare)) else {
            continue;
        };
        let suffix = tokens
            .get(i + 1)
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
            .filter(|t| t.chars().any(|c| c.is_ascii_digit()));
        return match suffix {
            Some(model) => format!("{} {}", keyword, model),
            None => keyword.clone(),
        };
    }
    String::new()
}

/// First lexicon phrase found, compared without accents or case.
fn find_status(text: &str, lexicon: &[String]) -> String {
    let haystack = format!(" {} ", fold_accents(text).to_lowercase());
    lexicon
        .iter()
        .find(|phrase| {
            let needle = format!(" {} ", fold_accents(phrase).to_lowercase());
            haystack.contains(&needle)
        })
        .cloned()
        .unwrap_or_default()
}

/// Explicit "S/N:" serial, else the first token that looks like one.
fn find_serial(text: &str, stoplist: &[String]) -> String {
    if let Some(serial) = SERIAL_LABELED
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .find(|s| looks_like_serial(s, stoplist))
    {
        return serial;
    }

    text.split(|c: char| c.is_whitespace() || matches!(c, '|' | ',' | ';'))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .find(|t| looks_like_serial(t, stoplist))
        .map(str::to_string)
        .unwrap_or_default()
}

fn row_bands<'a>(heading: &Rect, layout: &'a EquipmentLayout) -> impl Iterator<Item = Rect> + 'a {
    let heading = *heading;
    (0..layout.max_rows).map(move |i| {
        Rect::from_origin(
            heading.x0 + layout.row_dx,
            heading.y1 + layout.row_dy + i as f32 * layout.row_step,
            layout.row_width,
            layout.row_height,
        )
    })
}

/// First structured row under the heading of `page`.
pub fn structured_row(page: &PdfPage, layout: &EquipmentLayout) -> Option<EquipmentRecord> {
    let heading = find_label(page, &layout.headings)?;
    row_bands(&heading, layout)
        .map(|band| page.text_in(&band))
        .find_map(|text| parse_row(&text, &layout.serial_stoplist))
}

/// Lexicon scan of the area under the heading of `page`.
pub fn fallback_scan(page: &PdfPage, layout: &EquipmentLayout) -> Option<EquipmentRecord> {
    let heading = find_label(page, &layout.headings)?;
    let text = page.text_in(&layout.fallback.resolve(&heading));
    let record = scan_area(&text, layout);
    (!record.is_empty()).then_some(record)
}

/// Extract the first equipment entry from the given pages, in order.
pub fn extract_equipment(pages: &[&PdfPage], layout: &EquipmentLayout) -> EquipmentRecord {
    for page in pages {
        if let Some(record) = structured_row(page, layout) {
            debug!("Equipment from structured row on page {}", page.number);
            return record;
        }
    }

    for page in pages {
        if let Some(record) = fallback_scan(page, layout) {
            debug!("Equipment from lexicon scan on page {}", page.number);
            return record;
        }
    }

    trace!("No equipment entry found");
    EquipmentRecord::default()
}
