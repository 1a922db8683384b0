//! Word-level access to a single page.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Word};

/// Default vertical tolerance (points) for grouping words into one line.
pub const DEFAULT_LINE_TOLERANCE: f32 = 3.0;

/// A decoded page: its size and the word tokens it produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    words: Vec<Word>,
}

impl PdfPage {
    /// Create a page from already positioned words (content-stream order).
    pub fn from_words(number: u32, width: f32, height: f32, words: Vec<Word>) -> Self {
        Self {
            number,
            width,
            height,
            words,
        }
    }

    /// Word tokens in content-stream order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Find every occurrence of `needle`, returned as bounding rectangles in
    /// document order.
    ///
    /// Matching is case-insensitive. A single-token needle matches any word
    /// containing it. A multi-token needle must span consecutive words on one
    /// line: the first word ends with the first token, inner words are equal
    /// to their tokens and the last word starts with the last token.
    pub fn search_for(&self, needle: &str) -> Vec<Rect> {
        let tokens: Vec<String> = needle.split_whitespace().map(str::to_lowercase).collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let lowered: Vec<String> = self.words.iter().map(|w| w.text.to_lowercase()).collect();
        let mut hits = Vec::new();

        if tokens.len() == 1 {
            for (word, text) in self.words.iter().zip(&lowered) {
                if text.contains(&tokens[0]) {
                    hits.push(word.rect);
                }
            }
            return hits;
        }

        let last = tokens.len() - 1;
        for start in 0..self.words.len() {
            if start + last >= self.words.len() {
                break;
            }
            let first_word = &self.words[start];
            let matched = tokens.iter().enumerate().all(|(i, token)| {
                let word = &self.words[start + i];
                let text = &lowered[start + i];
                if !same_line(first_word, word) {
                    return false;
                }
                if i == 0 {
                    text.ends_with(token.as_str())
                } else if i == last {
                    text.starts_with(token.as_str())
                } else {
                    text == token
                }
            });
            if matched {
                let rect = self.words[start..=start + last]
                    .iter()
                    .skip(1)
                    .fold(first_word.rect, |acc, w| acc.union(&w.rect));
                hits.push(rect);
            }
        }

        hits
    }

    /// Words intersecting `rect`, sorted top-to-bottom then left-to-right.
    pub fn words_in(&self, rect: &Rect) -> Vec<&Word> {
        let mut words: Vec<&Word> = self
            .words
            .iter()
            .filter(|w| w.rect.intersects(rect))
            .collect();
        words.sort_by(|a, b| reading_order(&a.rect, &b.rect));
        words
    }

    /// Text of every word intersecting `rect`, joined with single spaces.
    pub fn text_in(&self, rect: &Rect) -> String {
        self.words_in(rect)
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text inside `rect` grouped into visual lines.
    ///
    /// Words whose top edge lies within `tolerance` of the current line's top
    /// edge join that line (left-to-right); otherwise a new line starts.
    pub fn lines_in(&self, rect: &Rect, tolerance: f32) -> Vec<String> {
        let mut rows: Vec<(f32, Vec<&Word>)> = Vec::new();

        for word in self.words_in(rect) {
            match rows.last_mut() {
                Some((top, row)) if (word.rect.y0 - *top).abs() <= tolerance => row.push(word),
                _ => rows.push((word.rect.y0, vec![word])),
            }
        }

        rows.into_iter()
            .map(|(_, mut row)| {
                row.sort_by(|a, b| a.rect.x0.partial_cmp(&b.rect.x0).unwrap_or(Ordering::Equal));
                row.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ")
            })
            .collect()
    }

    /// Whole-page text in reading order, one visual line per text line.
    pub fn text(&self) -> String {
        let full = Rect::new(f32::MIN, f32::MIN, f32::MAX, f32::MAX);
        self.lines_in(&full, DEFAULT_LINE_TOLERANCE).join("\n")
    }
}

fn same_line(a: &Word, b: &Word) -> bool {
    (a.rect.y0 - b.rect.y0).abs() <= DEFAULT_LINE_TOLERANCE
}

fn reading_order(a: &Rect, b: &Rect) -> Ordering {
    a.y0.partial_cmp(&b.y0)
        .unwrap_or(Ordering::Equal)
        .then(a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal))
}
