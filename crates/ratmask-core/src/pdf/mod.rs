//! PDF processing: document handle, positioned words and page geometry.

mod content;
mod extractor;
mod geometry;
mod page;

pub use extractor::PdfExtractor;
pub use geometry::{Rect, Word};
pub use page::{DEFAULT_LINE_TOLERANCE, PdfPage};

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Decode every page into positioned words, in page order.
    fn pages(&self) -> Result<Vec<PdfPage>>;

    /// Extract plain text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// First decodable image on page 1, used as OCR input.
    fn first_page_image(&self) -> Result<DynamicImage>;
}
