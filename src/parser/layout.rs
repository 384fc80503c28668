//! Layout analysis: grouping positioned words into lines and blocks.
//!
//! Words are ordered top-to-bottom, then left-to-right, and merged into
//! lines when their top edges are close relative to their height. Lines
//! are merged into blocks while they overlap horizontally and share font
//! size and family. Each block becomes one [`TextElement`].

use std::cmp::Ordering;

use crate::model::{BBox, Line, TextElement, Word};

use super::options::ParseOptions;
use super::words::FontSpan;

/// Groups the words of a page into text elements.
#[derive(Debug, Clone)]
pub struct LayoutAnalyzer {
    line_margin: f32,
    block_overlap_ratio: f32,
    font_size_tolerance: f32,
    default_font_name: String,
    default_font_size: f32,
}

impl LayoutAnalyzer {
    /// Create an analyzer from parse options.
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            line_margin: options.line_margin,
            block_overlap_ratio: options.block_overlap_ratio,
            font_size_tolerance: options.font_size_tolerance,
            default_font_name: options.default_font_name.clone(),
            default_font_size: options.default_font_size,
        }
    }

    /// Group one page's words into text elements in reading order.
    ///
    /// `spans` resolves fonts for lines whose words carry none.
    pub fn analyze(&self, words: Vec<Word>, spans: &[FontSpan]) -> Vec<TextElement> {
        if words.is_empty() {
            return vec![];
        }
        let lines = self.group_words_into_lines(words, spans);
        let blocks = self.group_lines_into_blocks(lines);
        blocks.into_iter().filter_map(finalize_block).collect()
    }

    /// Group words into merged lines.
    pub fn group_words_into_lines(&self, words: Vec<Word>, spans: &[FontSpan]) -> Vec<Line> {
        let mut words: Vec<Word> = words
            .into_iter()
            .filter(|w| {
                let b = &w.bbox;
                let finite = [b.x0, b.y0, b.x1, b.y1].iter().all(|v| v.is_finite());
                if !finite {
                    log::debug!("Skipping word {:?} with malformed box {:?}", w.text, w.bbox);
                }
                finite && !w.text.trim().is_empty()
            })
            .collect();

        words.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then(a.bbox.y0.total_cmp(&b.bbox.y0))
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        let mut lines = Vec::new();
        let mut current: Vec<Word> = Vec::new();

        for word in words {
            if let Some(prev) = current.last() {
                let threshold = word.height().max(prev.height()) * self.line_margin;
                let new_line = prev.page_index != word.page_index
                    || (word.bbox.y0 - prev.bbox.y0).abs() > threshold;
                if new_line {
                    lines.push(self.merge_line(std::mem::take(&mut current), spans));
                }
            }
            current.push(word);
        }
        if !current.is_empty() {
            lines.push(self.merge_line(current, spans));
        }

        lines
    }

    /// Merge the words of one line left to right.
    fn merge_line(&self, mut words: Vec<Word>, spans: &[FontSpan]) -> Line {
        words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let bbox = BBox::union_all(words.iter().map(|w| &w.bbox)).unwrap_or_default();
        let font_size = words.iter().map(|w| w.height()).sum::<f32>() / words.len() as f32;

        let font_name = words
            .iter()
            .find_map(|w| w.font_name.clone())
            .or_else(|| self.lookup_font(&words[0], spans))
            .unwrap_or_else(|| self.default_font_name.clone());

        let font_size = if font_size > 0.0 {
            font_size
        } else {
            self.default_font_size
        };

        Line {
            text,
            page_index: words[0].page_index,
            bbox,
            font_name,
            font_size,
            word_count: words.len(),
        }
    }

    /// Font of the first span containing the word's center, if any.
    fn lookup_font(&self, word: &Word, spans: &[FontSpan]) -> Option<String> {
        let (cx, cy) = word.bbox.center();
        let found = spans
            .iter()
            .find(|s| s.bbox.contains_point(cx, cy))
            .map(|s| s.font_name.clone());
        if found.is_none() {
            log::debug!("No font span for {:?}, using default font", word.text);
        }
        found
    }

    /// Group lines into blocks.
    pub fn group_lines_into_blocks(&self, lines: Vec<Line>) -> Vec<Vec<Line>> {
        let mut blocks: Vec<Vec<Line>> = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            if let Some(prev) = current.last() {
                if self.should_break_block(prev, &line) {
                    blocks.push(std::mem::take(&mut current));
                }
            }
            current.push(line);
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        blocks
    }

    /// Whether `curr` starts a new block after `prev`.
    pub fn should_break_block(&self, prev: &Line, curr: &Line) -> bool {
        if prev.page_index != curr.page_index {
            return true;
        }

        let overlap = prev.bbox.horizontal_overlap(&curr.bbox);
        let min_width = prev.width().min(curr.width());
        if overlap < min_width * self.block_overlap_ratio {
            return true;
        }

        if (prev.font_size - curr.font_size).abs() > self.font_size_tolerance {
            return true;
        }

        font_family(&prev.font_name) != font_family(&curr.font_name)
    }
}

impl Default for LayoutAnalyzer {
    fn default() -> Self {
        Self::new(&ParseOptions::default())
    }
}

/// Family part of a font name: text before the first hyphen, lowercased.
pub fn font_family(font_name: &str) -> String {
    font_name
        .split('-')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn finalize_block(lines: Vec<Line>) -> Option<TextElement> {
    let first = lines.first()?;
    let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox))?;
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Some(TextElement::new(
        text,
        first.page_index,
        bbox,
        first.font_name.clone(),
        first.font_size,
    ))
}

/// Reading-order comparison of two elements: page, then top, then left.
pub fn reading_order(a: &TextElement, b: &TextElement) -> Ordering {
    a.page_index
        .cmp(&b.page_index)
        .then(a.bbox().y0.total_cmp(&b.bbox().y0))
        .then(a.bbox().x0.total_cmp(&b.bbox().x0))
}
