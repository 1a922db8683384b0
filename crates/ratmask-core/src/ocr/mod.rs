//! Optional OCR collaborator used to recover a contact number from the
//! first page image when the text layer left essential fields empty.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;

use crate::error::OcrError;
use crate::extract::normalize::digits_or_clean;
use crate::extract::patterns::CONTACT_LABELED;
use crate::models::fields::{FieldMap, keys};

/// Anything that turns a page image into plain text.
pub trait OcrEngine {
    /// Recognize the text of `image`, one detected line per text line.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Fields whose absence triggers the OCR fallback.
pub const ESSENTIAL_FIELDS: [&str; 4] = [
    keys::CALL_NUMBER,
    keys::ACKNOWLEDGER,
    keys::TECHNICIAN,
    keys::CONTACT,
];

/// Whether any essential field is still blank.
pub fn needs_ocr(fields: &FieldMap) -> bool {
    ESSENTIAL_FIELDS.iter().any(|key| fields.is_blank(key))
}

/// Contact number following a "Contato"/"Telefone"/"Tel" label in OCR text.
pub fn recover_contact(text: &str) -> Option<String> {
    let raw = CONTACT_LABELED.captures(text)?.get(1)?.as_str();
    let value = digits_or_clean(raw);
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedText(&'static str);

    impl OcrEngine for FixedText {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_recover_contact() {
        assert_eq!(
            recover_contact("Tecnico: Fulano\nContato: (21) 98765-4321").as_deref(),
            Some("98765")
        );
        assert_eq!(
            recover_contact("TELEFONE 21987654321").as_deref(),
            Some("21987654321")
        );
        assert_eq!(recover_contact("Tel.: 2199 8877").as_deref(), Some("2199 8877"));
        assert_eq!(recover_contact("sem telefone informado"), None);
    }

    #[test]
    fn test_needs_ocr() {
        let mut fields = FieldMap::new();
        assert!(needs_ocr(&fields));

        for key in ESSENTIAL_FIELDS {
            fields.append(key, "x");
        }
        assert!(!needs_ocr(&fields));

        let mut partial = fields.clone();
        partial.append(keys::OBSERVATIONS, "obs");
        assert!(!needs_ocr(&partial));
    }

    #[test]
    fn test_engine_trait_object() {
        let engine: Box<dyn OcrEngine> = Box::new(FixedText("Contato: 21999990000"));
        let text = engine.recognize(&DynamicImage::new_rgb8(1, 1)).unwrap();
        assert_eq!(recover_contact(&text).as_deref(), Some("21999990000"));
    }
}
