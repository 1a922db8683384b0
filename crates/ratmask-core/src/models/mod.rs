//! Data models: extracted fields and configuration.

pub mod config;
pub mod fields;

pub use config::{OcrConfig, PdfConfig, RatConfig};
pub use fields::{EquipmentRecord, FieldMap, TestFlag};
