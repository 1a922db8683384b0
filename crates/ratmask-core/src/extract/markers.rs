//! Inline `[[FIELD:key=value]]` markers.

use super::patterns::FIELD_MARKER;
use crate::models::fields::FieldMap;

/// Whether the text carries at least one field marker.
pub fn has_markers(text: &str) -> bool {
    FIELD_MARKER.is_match(text)
}

/// Collect every marker in `text`.
///
/// Keys and values are trimmed; markers with an empty key are ignored and
/// repeated keys accumulate in encounter order.
pub fn parse_markers(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    for caps in FIELD_MARKER.captures_iter(text) {
        let key = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        if key.is_empty() {
            continue;
        }
        fields.append(key, value);
    }
    fields
}
