//! Word, line and element records.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A single glyph run as read from the page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    /// 0-based page index
    pub page_index: usize,
    pub bbox: BBox,
    /// Font the word was drawn with, when the extractor knows it
    pub font_name: Option<String>,
    /// Effective font size in points, when known
    pub font_size: Option<f32>,
}

impl Word {
    pub fn new(text: impl Into<String>, page_index: usize, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            page_index,
            bbox,
            font_name: None,
            font_size: None,
        }
    }

    pub fn with_font(mut self, name: impl Into<String>, size: f32) -> Self {
        self.font_name = Some(name.into());
        self.font_size = Some(size);
        self
    }

    pub fn height(&self) -> f32 {
        self.bbox.height()
    }
}

/// Words sharing one baseline, merged left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub page_index: usize,
    pub bbox: BBox,
    pub font_name: String,
    /// Average glyph height of the line's words
    pub font_size: f32,
    /// Number of words merged into this line
    pub word_count: usize,
}

impl Line {
    pub fn width(&self) -> f32 {
        self.bbox.width()
    }
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    /// From 8-bit channel values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Horizontal alignment of rendered text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// A block of text: the unit of translation and layout.
///
/// The box is private so that `width`/`height` always match it. When
/// deserialized, the dimensions are recomputed from the box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ElementRecord")]
pub struct TextElement {
    /// Original text, lines joined with `\n`
    pub text: String,
    pub page_index: usize,
    bbox: BBox,
    width: f32,
    height: f32,
    pub font_name: String,
    pub font_size: f32,
    pub color: Option<Color>,
    pub alignment: Option<Alignment>,
    pub translated_text: Option<String>,
    pub is_complete: bool,
}

/// Serialized form of a [`TextElement`]; stored dimensions are ignored.
#[derive(Deserialize)]
struct ElementRecord {
    text: String,
    page_index: usize,
    bbox: BBox,
    font_name: String,
    font_size: f32,
    #[serde(default)]
    color: Option<Color>,
    #[serde(default)]
    alignment: Option<Alignment>,
    #[serde(default)]
    translated_text: Option<String>,
    #[serde(default)]
    is_complete: bool,
}

impl From<ElementRecord> for TextElement {
    fn from(record: ElementRecord) -> Self {
        let mut element = TextElement::new(
            record.text,
            record.page_index,
            record.bbox,
            record.font_name,
            record.font_size,
        );
        element.color = record.color;
        element.alignment = record.alignment;
        element.translated_text = record.translated_text;
        element.is_complete = record.is_complete;
        element
    }
}

impl TextElement {
    pub fn new(
        text: impl Into<String>,
        page_index: usize,
        bbox: BBox,
        font_name: impl Into<String>,
        font_size: f32,
    ) -> Self {
        Self {
            text: text.into(),
            page_index,
            bbox,
            width: bbox.width(),
            height: bbox.height(),
            font_name: font_name.into(),
            font_size,
            color: None,
            alignment: None,
            translated_text: None,
            is_complete: false,
        }
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Replace the box, keeping the derived dimensions in sync.
    pub fn set_bbox(&mut self, bbox: BBox) {
        self.bbox = bbox;
        self.width = bbox.width();
        self.height = bbox.height();
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Record a translation and mark the element complete.
    pub fn set_translation(&mut self, translated: impl Into<String>) {
        self.translated_text = Some(translated.into());
        self.is_complete = true;
    }

    /// Translation if present and non-blank.
    pub fn translation(&self) -> Option<&str> {
        self.translated_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Text to draw: the translation, or the original when `fallback` is
    /// set and no translation exists.
    pub fn display_text(&self, fallback: bool) -> Option<&str> {
        match self.translation() {
            Some(t) => Some(t),
            None if fallback && !self.text.trim().is_empty() => Some(&self.text),
            None => None,
        }
    }
}
