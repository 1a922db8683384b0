//! RAT field extraction.
//!
//! A document is read one of two ways. When its text carries
//! `[[FIELD:key=value]]` markers those are authoritative and nothing else is
//! read. Otherwise the template table drives a geometric read: labels are
//! located on the page and values are taken from regions relative to them.
//! Both ways fill the same [`FieldMap`] keys.

pub mod equipment;
pub mod locator;
pub mod markers;
pub mod normalize;
pub mod patterns;
pub mod sections;
pub mod template;

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{OcrError, Result};
use crate::mask::{MaskDocument, MaskInput, build_mask};
use crate::models::config::RatConfig;
use crate::models::fields::{FieldMap, keys};
use crate::ocr::{OcrEngine, needs_ocr, recover_contact};
use crate::pdf::{PdfExtractor, PdfPage, PdfProcessor};

use self::equipment::extract_equipment;
use self::markers::{has_markers, parse_markers};
use self::sections::{extract_call_number, extract_free_text, extract_identification};

/// How the field map was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Inline `[[FIELD:...]]` markers.
    Markers,
    /// Label-anchored geometric read.
    Geometric,
}

/// Outcome of one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Assembled closing report.
    pub mask: MaskDocument,
    /// Raw field map, for diagnostics.
    pub fields: FieldMap,
    /// Strategy that produced the field map.
    pub mode: ExtractionMode,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Drives one document through extraction and mask assembly.
pub struct RatExtractor {
    config: RatConfig,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl RatExtractor {
    pub fn new(config: RatConfig) -> Self {
        Self { config, ocr: None }
    }

    /// Build an extractor, loading the OCR engine when the configuration
    /// enables it. A model that fails to load only disables the fallback.
    #[cfg(feature = "native")]
    pub fn from_config(config: RatConfig) -> Self {
        let mut extractor = Self::new(config);
        if extractor.config.ocr.enabled {
            let ocr = &extractor.config.ocr;
            match crate::ocr::PureOcrEngine::from_dir(&ocr.model_dir, ocr.clone()) {
                Ok(engine) => extractor.ocr = Some(Box::new(engine)),
                Err(e) => warn!("OCR fallback disabled: {}", e),
            }
        }
        extractor
    }

    /// Use `engine` for the OCR fallback.
    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn config(&self) -> &RatConfig {
        &self.config
    }

    /// Extract fields from a PDF file and assemble its mask.
    pub fn extract_file(&self, path: &Path) -> Result<ExtractionResult> {
        let data = std::fs::read(path)?;
        self.extract(&data)
    }

    /// Extract fields from PDF bytes and assemble the mask.
    ///
    /// Only a document that cannot be opened is an error; missing fields
    /// come back as empty values.
    pub fn extract(&self, pdf_bytes: &[u8]) -> Result<ExtractionResult> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let (fields, mode) = {
            let pdf = PdfExtractor::open(pdf_bytes)?;
            info!("Opened document with {} pages", pdf.page_count());

            let pages = match pdf.pages() {
                Ok(pages) => pages,
                Err(e) => {
                    warnings.push(format!("page decoding failed: {}", e));
                    Vec::new()
                }
            };

            let (mut fields, mode) = match self.marker_fields(&pdf, &pages) {
                Some(fields) => (fields, ExtractionMode::Markers),
                None => (self.extract_fields(&pages), ExtractionMode::Geometric),
            };
            info!("Extracted {} fields using {:?} mode", fields.len(), mode);

            if needs_ocr(&fields) {
                self.ocr_fallback(&pdf, &mut fields, &mut warnings);
            }

            (fields, mode)
        };

        let mask = build_mask(&MaskInput::from_fields(&fields));

        Ok(ExtractionResult {
            mask,
            fields,
            mode,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Marker fields from the word layer, else from the plain-text layer.
    fn marker_fields(&self, pdf: &PdfExtractor, pages: &[PdfPage]) -> Option<FieldMap> {
        let word_text = pages.iter().map(PdfPage::text).collect::<Vec<_>>().join("\n");
        if has_markers(&word_text) {
            debug!("Found field markers in word layer");
            return Some(parse_markers(&word_text));
        }

        match pdf.extract_text() {
            Ok(text) if has_markers(&text) => {
                debug!("Found field markers in text layer");
                Some(parse_markers(&text))
            }
            Ok(_) => None,
            Err(e) => {
                trace!("Text layer unavailable: {}", e);
                None
            }
        }
    }

    /// Geometric extraction over decoded pages.
    ///
    /// Page 1 holds the identification block; page 2 holds the free-text
    /// blocks. A single-page document reuses page 1 for both when
    /// configured to.
    pub fn extract_fields(&self, pages: &[PdfPage]) -> FieldMap {
        let layout = &self.config.template;
        let tolerance = self.config.pdf.line_tolerance;
        let blank = PdfPage::default();

        let first = pages.first().unwrap_or(&blank);
        let second = match pages.get(1) {
            Some(page) => page,
            None if self.config.pdf.reuse_first_page => {
                debug!("Single-page document, reading report blocks from page 1");
                first
            }
            None => &blank,
        };

        let mut fields = FieldMap::new();
        let call_number = extract_call_number(first, layout, tolerance);
        fields.append(keys::CALL_NUMBER, &call_number);
        extract_identification(first, layout, tolerance, &mut fields);
        extract_free_text(second, layout, tolerance, &mut fields);

        let scan: Vec<&PdfPage> = if pages.is_empty() {
            vec![first]
        } else {
            pages.iter().collect()
        };
        extract_equipment(&scan, &layout.equipment).write_to(&mut fields);

        fields
    }

    /// Best-effort contact recovery from the page 1 image.
    fn ocr_fallback(&self, pdf: &PdfExtractor, fields: &mut FieldMap, warnings: &mut Vec<String>) {
        let Some(engine) = &self.ocr else {
            trace!("Essential fields missing, no OCR engine configured");
            return;
        };

        let image = match pdf.first_page_image() {
            Ok(image) => image,
            Err(e) => {
                debug!("OCR skipped: {}", OcrError::NoImage(e.to_string()));
                return;
            }
        };

        match engine.recognize(&image) {
            Ok(text) => {
                if let Some(contact) = recover_contact(&text) {
                    if fields.is_blank(keys::CONTACT) {
                        info!("Recovered contact from OCR");
                    }
                    fields.fill_blank(keys::CONTACT, &contact);
                }
            }
            Err(e) => {
                warn!("OCR failed: {}", e);
                warnings.push(format!("OCR failed: {}", e));
            }
        }
    }
}

impl Default for RatExtractor {
    fn default() -> Self {
        Self::new(RatConfig::default())
    }
}
