//! Document-level types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
    /// Lower-left corner of the media box in PDF user space
    pub origin: (f32, f32),
}

impl PageInfo {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            rotation: 0,
            origin: (0.0, 0.0),
        }
    }

    /// US Letter, used when a page declares no usable MediaBox.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Media box as `[llx, lly, urx, ury]`.
    pub fn media_box(&self) -> [f32; 4] {
        [
            self.origin.0,
            self.origin.1,
            self.origin.0 + self.width,
            self.origin.1 + self.height,
        ]
    }
}

/// Document metadata from the trailer Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// PDF producer
    pub producer: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// The writable text fields as `(Info key, value)` pairs, skipping
    /// empty ones.
    pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

/// Per-document page cache; read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub pages: Vec<PageInfo>,
    pub metadata: Metadata,
}

impl DocumentInfo {
    pub fn new(pages: Vec<PageInfo>) -> Self {
        Self {
            pages,
            metadata: Metadata::default(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page geometry by 0-based index.
    pub fn page(&self, index: usize) -> Option<&PageInfo> {
        self.pages.get(index)
    }
}
