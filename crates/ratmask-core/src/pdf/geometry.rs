//! Page geometry primitives.
//!
//! Coordinates are page points with the origin at the top-left corner of the
//! media box and `y` growing downward, so "below" means a larger `y`.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle from its corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle from its top-left corner and size.
    pub fn from_origin(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Whether the two rectangles share any area (touching edges count).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Squared euclidean distance from the center of the rectangle to a point.
    pub fn center_distance_sq(&self, point: (f32, f32)) -> f32 {
        let (cx, cy) = self.center();
        let dx = cx - point.0;
        let dy = cy - point.1;
        dx * dx + dy * dy
    }
}

/// A word token on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Bounding box of the word.
    pub rect: Rect,
    /// Word text (never contains whitespace).
    pub text: String,
    /// Text object (BT..ET) index on the page.
    pub block: usize,
    /// Line index within the block.
    pub line: usize,
    /// Word index within the line.
    pub word: usize,
}

impl Word {
    pub fn new(rect: Rect, text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
            block: 0,
            line: 0,
            word: 0,
        }
    }

    /// Set the block/line/word indices.
    pub fn with_index(mut self, block: usize, line: usize, word: usize) -> Self {
        self.block = block;
        self.line = line;
        self.word = word;
        self
    }
}
