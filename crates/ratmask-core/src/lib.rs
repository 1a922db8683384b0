//! Core library for RAT service-report processing.
//!
//! This crate provides:
//! - PDF access (positioned words, label search, page images)
//! - Field extraction from inline `[[FIELD:...]]` markers or by label-anchored
//!   geometry driven by a declarative template table
//! - Value normalization and equipment-list parsing
//! - Closing-report ("mask") assembly
//! - An optional OCR fallback for the contact number

pub mod error;
pub mod extract;
pub mod mask;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use error::{OcrError, PdfError, RatError, Result};
pub use extract::template::TemplateLayout;
pub use extract::{ExtractionMode, ExtractionResult, RatExtractor};
pub use mask::{MaskDocument, MaskInput, build_mask};
pub use models::{EquipmentRecord, FieldMap, OcrConfig, PdfConfig, RatConfig, TestFlag};
pub use ocr::OcrEngine;
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{PdfExtractor, PdfPage, PdfProcessor, Rect, Word};

/// Extract fields from PDF bytes with the default configuration and return
/// the assembled mask together with the raw field map.
pub fn extract_from_pdf(pdf_bytes: &[u8]) -> Result<(MaskDocument, FieldMap)> {
    let result = RatExtractor::default().extract(pdf_bytes)?;
    Ok((result.mask, result.fields))
}
