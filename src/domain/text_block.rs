use serde::{Deserialize, Serialize};

/// Smallest extracted text unit: one span of text with its page and
/// coordinates, as reported by the PDF parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: BlockId,
    pub page_num: u32,
    pub bbox: BoundingBox,
    pub text: String,
}

impl TextBlock {
    pub fn new(page_num: u32, index_on_document: usize, bbox: BoundingBox, text: String) -> Self {
        Self {
            id: BlockId::new(page_num, index_on_document),
            page_num,
            bbox,
            text,
        }
    }
}

/// Deterministic block identifier: a function of the page and the block's
/// position in extraction order, so re-extracting identical bytes yields
/// identical ids and the cache can be keyed on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(page_num: u32, index_on_document: usize) -> Self {
        Self(format!("page_{}_block_{}", page_num, index_on_document))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box in PDF page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}
