//! Extraction and grouping options.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for extracting and grouping text.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// A new line starts when the top edge moves by more than this
    /// fraction of the taller word's height.
    pub line_margin: f32,

    /// Minimum horizontal overlap, as a fraction of the narrower line,
    /// for two lines to share a block.
    pub block_overlap_ratio: f32,

    /// Largest font-size difference (pt) tolerated within a block.
    pub font_size_tolerance: f32,

    /// Font name used when no font can be resolved for a line
    pub default_font_name: String,

    /// Font size used when no font can be resolved for a line
    pub default_font_size: f32,

    /// Page selection (which pages to extract)
    pub pages: PageSelection,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_margin(mut self, margin: f32) -> Self {
        self.line_margin = margin;
        self
    }

    pub fn with_block_overlap(mut self, ratio: f32) -> Self {
        self.block_overlap_ratio = ratio;
        self
    }

    pub fn with_font_size_tolerance(mut self, points: f32) -> Self {
        self.font_size_tolerance = points;
        self
    }

    /// Set the fallback font for lines without font information.
    pub fn with_default_font(mut self, name: impl Into<String>, size: f32) -> Self {
        self.default_font_name = name.into();
        self.default_font_size = size;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            line_margin: 0.3,
            block_overlap_ratio: 0.5,
            font_size_tolerance: 2.0,
            default_font_name: "Helvetica".to_string(),
            default_font_size: 12.0,
            pages: PageSelection::All,
        }
    }
}

/// Page selection, 1-indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());
        let number = |p: &str| p.trim().parse::<u32>().map_err(|_| invalid());

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = (number(start)?, number(end)?);
                if start == 0 || start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let (start, end) = match part.split_once('-') {
                Some((a, b)) => (number(a)?, number(b)?),
                None => {
                    let p = number(part)?;
                    (p, p)
                }
            };
            if start == 0 || start > end {
                return Err(invalid());
            }
            pages.extend(start..=end);
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
