//! PDF loading, word extraction and page images using lopdf and pdf-extract.

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, trace};

use super::content::{media_box, page_words};
use super::{PdfPage, PdfProcessor, Result};
use crate::error::PdfError;

/// PDF document handle backed by lopdf.
///
/// The handle owns the parsed document; dropping it releases everything.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create an extractor with no document loaded.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a document from bytes in one step.
    pub fn open(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Decode a single page into positioned words.
    pub fn page(&self, page: u32) -> Result<PdfPage> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;
        let [x0, y0, x1, y1] = media_box(doc, page_id);
        let words = page_words(doc, page_id)?;
        Ok(PdfPage::from_words(page, x1 - x0, y1 - y0, words))
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        let filter_name = dict.get(b"Filter").ok().and_then(|filter| match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter");
                return None;
            }
            _ => {}
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let pixels = usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?;
        let rgb_len = pixels.checked_mul(3)?;
        let rgba: Vec<u8> = match color_space {
            b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => data[..rgb_len]
                .chunks(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
            b"DeviceGray" | b"G" if data.len() >= pixels => {
                data[..pixels].iter().flat_map(|&g| [g, g, g, 255]).collect()
            }
            _ => return None,
        };

        ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
    }

    /// Get resources dictionary for a page, handling inheritance.
    fn page_resources(&self, doc: &Document, node_id: ObjectId) -> Option<lopdf::Dictionary> {
        let dict = doc.get_dictionary(node_id).ok()?;
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(doc, *parent_id),
            _ => None,
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn pages(&self) -> Result<Vec<PdfPage>> {
        let count = self.page_count();
        let mut pages = Vec::with_capacity(count as usize);
        for number in 1..=count {
            match self.page(number) {
                Ok(page) => pages.push(page),
                Err(e) => {
                    // An undecodable content stream reads as an empty page.
                    debug!("Page {} has no readable text: {}", number, e);
                    pages.push(PdfPage::from_words(number, 0.0, 0.0, Vec::new()));
                }
            }
        }
        Ok(pages)
    }

    fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn first_page_image(&self) -> Result<DynamicImage> {
        let doc = self.document()?;
        let page_id = self.page_id(1)?;

        let resources = self
            .page_resources(doc, page_id)
            .ok_or_else(|| PdfError::ImageExtraction("page 1 has no resources".to_string()))?;
        let xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|x| doc.dereference(x).ok())
            .and_then(|(_, x)| x.as_dict().ok())
            .ok_or_else(|| PdfError::ImageExtraction("page 1 has no XObjects".to_string()))?;

        for (_name, obj_ref) in xobjects.iter() {
            if let Ok((_, obj)) = doc.dereference(obj_ref) {
                if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                    debug!("Using {}x{} image from page 1", img.width(), img.height());
                    return Ok(img);
                }
            }
        }

        Err(PdfError::ImageExtraction(
            "No decodable image on page 1".to_string(),
        ))
    }
}
