//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RatError, Result};
use crate::extract::template::TemplateLayout;
use crate::pdf::DEFAULT_LINE_TOLERANCE;

/// Main configuration for ratmask.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatConfig {
    /// PDF reading configuration.
    pub pdf: PdfConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Template layout used by geometric extraction.
    pub template: TemplateLayout,
}

/// PDF reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Read page 2 blocks from page 1 when the document has a single page.
    pub reuse_first_page: bool,

    /// Vertical tolerance (points) when grouping block text into lines.
    pub line_tolerance: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            reuse_first_page: true,
            line_tolerance: DEFAULT_LINE_TOLERANCE,
        }
    }
}

/// OCR fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Load an OCR engine and use it when essential fields are missing.
    pub enabled: bool,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_dir: PathBuf::from("models"),
            keep_unk: false,
        }
    }
}

impl RatConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values extraction cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.pdf.line_tolerance.is_finite() || self.pdf.line_tolerance < 0.0 {
            return Err(RatError::Config(format!(
                "line_tolerance must be a non-negative number, got {}",
                self.pdf.line_tolerance
            )));
        }
        if self.template.call_number.is_empty() {
            return Err(RatError::Config(
                "template has no call number label groups".to_string(),
            ));
        }
        Ok(())
    }
}
