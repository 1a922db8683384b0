//! Positioned word extraction from page content streams.
//!
//! A small text-state interpreter over `lopdf` operations. It tracks the
//! graphics matrix stack and the text matrices, advances glyph positions with
//! the font `/Widths` table (or a Type0 font's descendant `/W` array) when
//! one is present, and emits one [`Word`] per whitespace-delimited run of
//! glyphs.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::trace;

use super::geometry::{Rect, Word};
use crate::error::PdfError;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Glyph advance (in text space units per 1 pt of font size) when a font has
/// no usable width table.
const DEFAULT_ADVANCE: f32 = 0.5;

/// TJ adjustments beyond this (thousandths of an em) are treated as a gap.
const TJ_WORD_GAP: f32 = 200.0;

/// Fraction of the font size above the baseline covered by a word box.
const ASCENT: f32 = 0.8;
/// Fraction of the font size below the baseline covered by a word box.
const DESCENT: f32 = 0.2;

/// Page media box as `[x0, y0, x1, y1]`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = Some(page_id);
    // Inherited attribute: walk up the page tree.
    while let Some(id) = current {
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Ok((_, Object::Array(values))) = doc.dereference(obj) {
                let nums: Vec<f32> = values.iter().filter_map(number).collect();
                if nums.len() == 4 {
                    return [nums[0], nums[1], nums[2], nums[3]];
                }
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    // US Letter, the PDF default.
    [0.0, 0.0, 612.0, 792.0]
}

/// Extract positioned words from one page.
pub(crate) fn page_words(doc: &Document, page_id: ObjectId) -> Result<Vec<Word>, PdfError> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
    let content = Content::decode(&data).map_err(|e| PdfError::TextExtraction(e.to_string()))?;

    let [mx0, _, _, my1] = media_box(doc, page_id);
    let mut interp = Interpreter::new(doc, &fonts, mx0, my1);
    for op in &content.operations {
        interp.apply(&op.operator, &op.operands);
    }
    interp.flush_word();

    trace!("Page object {:?}: {} words", page_id, interp.words.len());
    Ok(interp.words)
}

/// Glyph metrics of a page font.
#[derive(Debug, Clone)]
enum FontMetrics {
    /// One-byte codes with a `FirstChar`/`Widths` table.
    Simple(FontWidths),
    /// Type0 font with two-byte codes and descendant `/W` widths.
    Composite(CidWidths),
}

impl FontMetrics {
    fn from_dict(doc: &Document, font: &Dictionary) -> Option<Self> {
        match font.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Type0") => CidWidths::from_dict(doc, font).map(Self::Composite),
            _ => FontWidths::from_dict(doc, font).map(Self::Simple),
        }
    }

    fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Advance of every character code in `bytes`.
    fn advances(&self, bytes: &[u8]) -> Vec<f32> {
        match self {
            Self::Simple(table) => bytes.iter().map(|&b| table.advance(b)).collect(),
            Self::Composite(table) => bytes
                .chunks_exact(2)
                .map(|pair| table.advance(u16::from_be_bytes([pair[0], pair[1]])))
                .collect(),
        }
    }
}

/// Width table of a simple font.
#[derive(Debug, Clone)]
struct FontWidths {
    first_char: i64,
    widths: Vec<f32>,
    missing: f32,
}

impl FontWidths {
    fn from_dict(doc: &Document, font: &Dictionary) -> Option<Self> {
        let first_char = font.get(b"FirstChar").ok()?.as_i64().ok()?;
        let (_, widths) = doc.dereference(font.get(b"Widths").ok()?).ok()?;
        let widths: Vec<f32> = widths
            .as_array()
            .ok()?
            .iter()
            .map(|w| resolved_number(doc, w).unwrap_or(0.0) / 1000.0)
            .collect();
        let missing = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| doc.dereference(d).ok())
            .and_then(|(_, d)| d.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(number)
            .map(|w| w / 1000.0)
            .unwrap_or(DEFAULT_ADVANCE);

        Some(Self {
            first_char,
            widths,
            missing,
        })
    }

    fn advance(&self, code: u8) -> f32 {
        let idx = code as i64 - self.first_char;
        if idx < 0 {
            return self.missing;
        }
        match self.widths.get(idx as usize) {
            Some(w) if *w > 0.0 => *w,
            _ => self.missing,
        }
    }
}

/// Widths of a CID font: `(first, last, width)` ranges over `/DW`.
///
/// Codes are taken as CIDs (`Identity-H`).
#[derive(Debug, Clone)]
struct CidWidths {
    ranges: Vec<(u16, u16, f32)>,
    default: f32,
}

impl CidWidths {
    fn from_dict(doc: &Document, font: &Dictionary) -> Option<Self> {
        let (_, descendants) = doc.dereference(font.get(b"DescendantFonts").ok()?).ok()?;
        let (_, descendant) = doc.dereference(descendants.as_array().ok()?.first()?).ok()?;
        let descendant = descendant.as_dict().ok()?;

        let default = descendant
            .get(b"DW")
            .ok()
            .and_then(|w| resolved_number(doc, w))
            .map(|w| w / 1000.0)
            .unwrap_or(1.0);

        let ranges = match descendant.get(b"W").map(|w| doc.dereference(w)) {
            Ok(Ok((_, Object::Array(items)))) => parse_cid_widths(doc, items),
            _ => Vec::new(),
        };

        Some(Self { ranges, default })
    }

    fn advance(&self, cid: u16) -> f32 {
        self.ranges
            .iter()
            .find(|(first, last, _)| (*first..=*last).contains(&cid))
            .map(|(_, _, w)| *w)
            .unwrap_or(self.default)
    }
}

/// Parse a `/W` array: `c [w1 w2 ...]` and `c_first c_last w` entries.
fn parse_cid_widths(doc: &Document, items: &[Object]) -> Vec<(u16, u16, f32)> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + 1 < items.len() {
        let Some(first) = resolved_number(doc, &items[i]).map(|c| c as u16) else {
            break;
        };
        match doc.dereference(&items[i + 1]) {
            Ok((_, Object::Array(widths))) => {
                for (offset, w) in widths.iter().enumerate() {
                    let cid = first.saturating_add(offset as u16);
                    if let Some(w) = resolved_number(doc, w) {
                        ranges.push((cid, cid, w / 1000.0));
                    }
                }
                i += 2;
            }
            Ok((_, last)) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    items.get(i + 2).and_then(|w| resolved_number(doc, w)),
                ) else {
                    break;
                };
                ranges.push((first, last as u16, w / 1000.0));
                i += 3;
            }
            Err(_) => break,
        }
    }
    ranges
}

/// Word being accumulated from consecutive glyphs.
struct PendingWord {
    text: String,
    rect: Rect,
}

struct Interpreter<'a> {
    doc: &'a Document,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: HashMap<Vec<u8>, Option<FontMetrics>>,
    origin_x: f32,
    page_top: f32,

    ctm: Matrix,
    stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,

    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,

    block: usize,
    line: usize,
    word_in_line: usize,
    pending: Option<PendingWord>,
    words: Vec<Word>,
}

impl<'a> Interpreter<'a> {
    fn new(
        doc: &'a Document,
        fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        origin_x: f32,
        page_top: f32,
    ) -> Self {
        Self {
            doc,
            fonts,
            metrics: HashMap::new(),
            origin_x,
            page_top,
            ctm: IDENTITY,
            stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            block: 0,
            line: 0,
            word_in_line: 0,
            pending: None,
            words: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);

        match operator {
            "q" => self.stack.push(self.ctm),
            "Q" => {
                if let Some(m) = self.stack.pop() {
                    self.ctm = m;
                }
            }
            "cm" if operands.len() >= 6 => {
                let m = [num(0), num(1), num(2), num(3), num(4), num(5)];
                self.ctm = multiply(&m, &self.ctm);
            }
            "BT" => {
                self.flush_word();
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
                self.line = 0;
                self.word_in_line = 0;
            }
            "ET" => {
                self.flush_word();
                self.block += 1;
            }
            "Tf" if operands.len() >= 2 => {
                if let Ok(name) = operands[0].as_name() {
                    self.font = name.to_vec();
                }
                self.font_size = num(1);
            }
            "Tc" => self.char_spacing = num(0),
            "Tw" => self.word_spacing = num(0),
            "Tz" => self.h_scale = num(0) / 100.0,
            "TL" => self.leading = num(0),
            "Td" => self.move_line(num(0), num(1)),
            "TD" => {
                self.leading = -num(1);
                self.move_line(num(0), num(1));
            }
            "Tm" if operands.len() >= 6 => {
                self.flush_word();
                self.tm = [num(0), num(1), num(2), num(3), num(4), num(5)];
                self.tlm = self.tm;
                self.next_line();
            }
            "T*" => self.move_line(0.0, -self.leading),
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    self.show(bytes);
                }
            }
            "'" => {
                self.move_line(0.0, -self.leading);
                if let Some(bytes) = operands.first().and_then(string_bytes) {
                    self.show(bytes);
                }
            }
            "\"" if operands.len() >= 3 => {
                self.word_spacing = num(0);
                self.char_spacing = num(1);
                self.move_line(0.0, -self.leading);
                if let Some(bytes) = string_bytes(&operands[2]) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                let Some(Ok(items)) = operands.first().map(Object::as_array) else {
                    return;
                };
                for item in items {
                    if let Some(bytes) = string_bytes(item) {
                        self.show(bytes);
                    } else if let Some(adjust) = number(item) {
                        if adjust < -TJ_WORD_GAP {
                            self.flush_word();
                        }
                        let tx = -adjust / 1000.0 * self.font_size * self.h_scale;
                        self.tm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.tm);
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.flush_word();
        self.tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.tlm);
        self.tm = self.tlm;
        if ty != 0.0 {
            self.next_line();
        }
    }

    fn next_line(&mut self) {
        self.line += 1;
        self.word_in_line = 0;
    }

    fn show(&mut self, bytes: &[u8]) {
        let metrics = self.font_metrics();
        let composite = metrics.as_ref().is_some_and(FontMetrics::is_composite);
        let text: Vec<char> = self.decode(bytes, composite).chars().collect();
        if text.is_empty() {
            return;
        }

        // One advance per character; codes that decode to several
        // characters (or none) share the string's total width evenly.
        let mut widths = match &metrics {
            Some(metrics) => metrics.advances(bytes),
            None => vec![DEFAULT_ADVANCE; text.len()],
        };
        if widths.len() != text.len() {
            let total: f32 = widths.iter().sum();
            widths = vec![total / text.len() as f32; text.len()];
        }

        for (ch, w0) in text.into_iter().zip(widths) {
            let mut advance = w0 * self.font_size + self.char_spacing;
            if ch == ' ' && !composite {
                advance += self.word_spacing;
            }
            advance *= self.h_scale;

            if ch.is_whitespace() {
                self.flush_word();
            } else {
                let rect = self.glyph_rect(advance);
                match self.pending.as_mut() {
                    Some(word) => {
                        word.text.push(ch);
                        word.rect = word.rect.union(&rect);
                    }
                    None => {
                        self.pending = Some(PendingWord {
                            text: ch.to_string(),
                            rect,
                        })
                    }
                }
            }

            self.tm = multiply(&[1.0, 0.0, 0.0, 1.0, advance, 0.0], &self.tm);
        }
    }

    /// Box of a glyph starting at the current text position, in top-left
    /// page coordinates.
    fn glyph_rect(&self, advance: f32) -> Rect {
        let m = multiply(&self.tm, &self.ctm);
        let (sx, sy) = transform(&m, 0.0, 0.0);
        let (ex, _) = transform(&m, advance, 0.0);
        let size = (self.font_size * m[3].abs()).max(1.0);

        let baseline = self.page_top - sy;
        Rect::new(
            sx.min(ex) - self.origin_x,
            baseline - size * ASCENT,
            sx.max(ex) - self.origin_x,
            baseline + size * DESCENT,
        )
    }

    fn flush_word(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.words.push(
                Word::new(pending.rect, pending.text).with_index(
                    self.block,
                    self.line,
                    self.word_in_line,
                ),
            );
            self.word_in_line += 1;
        }
    }

    fn font_metrics(&mut self) -> Option<FontMetrics> {
        let doc = self.doc;
        let fonts = self.fonts;
        self.metrics
            .entry(self.font.clone())
            .or_insert_with_key(|name| {
                fonts
                    .get(name)
                    .and_then(|dict| FontMetrics::from_dict(doc, dict))
            })
            .clone()
    }

    fn decode(&self, bytes: &[u8], composite: bool) -> String {
        if let Some(font) = self.fonts.get(&self.font) {
            if let Ok(encoding) = font.get_font_encoding(self.doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }

        // Two-byte codes read as UTF-16BE; otherwise UTF-16BE with BOM,
        // else Latin-1.
        let utf16 = |data: &[u8]| {
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        };
        if composite {
            return utf16(bytes);
        }
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            return utf16(&bytes[2..]);
        }
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn resolved_number(doc: &Document, obj: &Object) -> Option<f32> {
    doc.dereference(obj).ok().and_then(|(_, obj)| number(obj))
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// `a × b` in PDF row-vector convention.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_translation() {
        let a = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        let b = [2.0, 0.0, 0.0, 2.0, 5.0, 5.0];
        let m = multiply(&a, &b);
        assert_eq!(transform(&m, 0.0, 0.0), (25.0, 45.0));
        assert_eq!(transform(&m, 1.0, 0.0), (27.0, 45.0));
    }

    #[test]
    fn test_font_widths_advance() {
        let widths = FontWidths {
            first_char: 32,
            widths: vec![0.25, 0.0, 0.6],
            missing: 0.5,
        };
        assert_eq!(widths.advance(32), 0.25);
        assert_eq!(widths.advance(33), 0.5);
        assert_eq!(widths.advance(34), 0.6);
        assert_eq!(widths.advance(10), 0.5);
        assert_eq!(widths.advance(200), 0.5);
    }

    #[test]
    fn test_cid_width_ranges() {
        let doc = Document::new();
        let items = vec![
            Object::Integer(32),
            Object::Array(vec![Object::Integer(250), Object::Integer(300)]),
            Object::Integer(65),
            Object::Integer(122),
            Object::Integer(750),
        ];
        let table = CidWidths {
            ranges: parse_cid_widths(&doc, &items),
            default: 1.0,
        };
        assert_eq!(table.advance(32), 0.25);
        assert_eq!(table.advance(33), 0.3);
        assert_eq!(table.advance(84), 0.75);
        assert_eq!(table.advance(199), 1.0);
    }

    /// One-page document showing `text` as two-byte codes in a Type0 font.
    fn type0_page(text: &str) -> (Document, ObjectId) {
        use lopdf::content::Operation;
        use lopdf::{Stream, StringFormat, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => "LiberationSans",
            "DW" => Object::Integer(1000),
            "W" => vec![
                Object::Integer(32),
                Object::Array(vec![Object::Integer(250)]),
                Object::Integer(65),
                Object::Integer(122),
                Object::Integer(750),
            ],
        });
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "LiberationSans",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant_id)],
        });

        let codes: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
                Operation::new("Td", vec![Object::Integer(40), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::String(codes, StringFormat::Hexadecimal)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn test_type0_font_uses_descendant_widths() {
        let (doc, page_id) = type0_page("Teste final ÇÇ");
        let words = page_words(&doc, page_id).unwrap();

        let spans: Vec<(&str, f32, f32)> = words
            .iter()
            .map(|w| (w.text.as_str(), w.rect.x0, w.rect.x1))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("Teste", 40.0, 77.5),
                ("final", 80.0, 117.5),
                ("ÇÇ", 120.0, 140.0),
            ]
        );
    }
}
