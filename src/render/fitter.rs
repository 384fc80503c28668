//! Fitting translated text into element boxes.
//!
//! The fitter wraps text to the box width and shrinks the font until the
//! wrapped lines fit the box height or the minimum size is reached. Text
//! is never truncated: at the minimum size, overflow is accepted.

use crate::error::{Error, Result};
use crate::font::TextMeasure;
use crate::model::{Alignment, BBox, PageInfo, TextElement};
use crate::script::shape_for_display;

use super::options::RenderOptions;

/// Width used when the margins leave no room in the box.
const FALLBACK_WIDTH: f32 = 10.0;

/// Wrapped text and the font size it was wrapped at.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// Lines in logical order, not yet shaped
    pub lines: Vec<String>,
    pub font_size: f32,
}

/// A physical line ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    /// Shaped, visually ordered text
    pub text: String,
    /// The same line in logical order, unshaped
    pub logical: String,
    /// Left edge of the drawn text in user space
    pub x: f32,
    /// Baseline in user space
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub alignment: Alignment,
}

/// Reject boxes without a positive, finite area.
pub fn check_box(bbox: &BBox) -> Result<()> {
    if bbox.is_valid() {
        Ok(())
    } else {
        Err(Error::Layout(format!(
            "degenerate box ({:.1}, {:.1}, {:.1}, {:.1})",
            bbox.x0, bbox.y0, bbox.x1, bbox.y1
        )))
    }
}

/// Word boundaries of Arabic-script text: whitespace and ZWNJ.
fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || c == '\u{200C}'
}

/// Wraps and sizes text with a [`TextMeasure`].
pub struct TextFitter<'a, M: TextMeasure + ?Sized> {
    metrics: &'a M,
    options: &'a RenderOptions,
}

impl<'a, M: TextMeasure + ?Sized> TextFitter<'a, M> {
    pub fn new(metrics: &'a M, options: &'a RenderOptions) -> Self {
        Self { metrics, options }
    }

    /// Usable line width inside a box of `box_width`.
    pub fn max_width(&self, box_width: f32) -> f32 {
        let width = box_width - 2.0 * self.options.margin;
        if width > 0.0 && width.is_finite() {
            width
        } else {
            FALLBACK_WIDTH
        }
    }

    fn line_height(&self, size: f32) -> f32 {
        size * self.options.line_height_ratio
    }

    /// Wrap `text` into a box and pick the font size.
    ///
    /// Text whose width fits the usable width stays on one line at the
    /// starting size, with line breaks folded into spaces. Only the floor
    /// applies to that size. Otherwise the size is clamped to the
    /// configured range and shrinks by the shrink factor until the lines
    /// fit the box height, never going below the minimum size.
    pub fn fit(
        &self,
        text: &str,
        box_width: f32,
        box_height: f32,
        font: &str,
        starting_size: f32,
    ) -> FitResult {
        let box_width = box_width.max(self.options.min_box);
        let box_height = box_height.max(self.options.min_box);
        let max_width = self.max_width(box_width);

        if text.trim().is_empty() {
            return FitResult {
                lines: vec![],
                font_size: self.options.clamp_font_size(starting_size),
            };
        }

        if starting_size.is_finite() {
            let original = starting_size.max(self.options.min_font_size);
            let single = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if self.metrics.text_width(&single, font, original) <= max_width {
                return FitResult {
                    lines: vec![single],
                    font_size: original,
                };
            }
        }

        let mut size = self.options.clamp_font_size(starting_size);
        let mut lines = self.wrap(text, max_width, font, size);
        while lines.len() > 1 && lines.len() as f32 * self.line_height(size) > box_height {
            let next = size * self.options.shrink_factor;
            if next < self.options.min_font_size {
                if size > self.options.min_font_size {
                    size = self.options.min_font_size;
                    lines = self.wrap(text, max_width, font, size);
                }
                break;
            }
            size = next;
            lines = self.wrap(text, max_width, font, size);
        }

        if lines.len() as f32 * self.line_height(size) > box_height && lines.len() > 1 {
            log::debug!(
                "{} lines overflow a {:.1}pt box at the {:.1}pt floor",
                lines.len(),
                box_height,
                size
            );
        } else if size < starting_size {
            log::debug!("Reduced font {:.1} -> {:.1}pt to fit", starting_size, size);
        }

        FitResult {
            lines,
            font_size: size,
        }
    }

    /// Wrap text to `max_width`, one paragraph per input line.
    pub fn wrap(&self, text: &str, max_width: f32, font: &str, size: f32) -> Vec<String> {
        let rtl = crate::script::contains_rtl_chars(text);
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if rtl {
                lines.extend(self.wrap_rtl(paragraph, max_width, font, size));
            } else {
                lines.extend(self.wrap_words(paragraph, max_width, font, size, false));
            }
        }
        lines
    }

    /// Character accumulation, falling back to word wrap.
    fn wrap_rtl(&self, text: &str, max_width: f32, font: &str, size: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for c in text.chars() {
            let mut candidate = current.clone();
            candidate.push(c);
            if !current.trim().is_empty()
                && self.metrics.text_width(&candidate, font, size) > max_width
            {
                lines.push(current.trim().to_string());
                current = c.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.trim().is_empty() {
            lines.push(current.trim().to_string());
        }

        let degenerate = lines.len() <= 1
            && lines
                .first()
                .map(|l| self.metrics.text_width(l, font, size) > max_width)
                .unwrap_or(false);
        if degenerate {
            return self.wrap_words(text, max_width, font, size, true);
        }
        lines
    }

    /// Greedy word wrap. Overlong words are split by character when
    /// `split_long` is set and kept whole otherwise.
    fn wrap_words(
        &self,
        text: &str,
        max_width: f32,
        font: &str,
        size: f32,
        split_long: bool,
    ) -> Vec<String> {
        let words: Vec<&str> = if split_long {
            text.split(is_word_separator)
                .filter(|w| !w.is_empty())
                .collect()
        } else {
            text.split_whitespace().collect()
        };

        let mut lines = Vec::new();
        let mut current = String::new();

        for word in words {
            if split_long && self.metrics.text_width(word, font, size) > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = self.split_chars(word, max_width, font, size);
                if let Some(last) = pieces.pop() {
                    lines.extend(pieces);
                    current = last;
                }
                continue;
            }

            if current.is_empty() {
                current = word.to_string();
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if self.metrics.text_width(&candidate, font, size) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn split_chars(&self, word: &str, max_width: f32, font: &str, size: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for c in word.chars() {
            let mut candidate = current.clone();
            candidate.push(c);
            if !current.is_empty() && self.metrics.text_width(&candidate, font, size) > max_width {
                pieces.push(std::mem::replace(&mut current, c.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    /// Fit `text` into `element`'s box and position each line on the page.
    ///
    /// Lines run top-down from the top edge of the box. Each line is
    /// shaped here, once, right before drawing.
    pub fn layout(
        &self,
        element: &TextElement,
        text: &str,
        font: &str,
        page: &PageInfo,
    ) -> Vec<RenderedLine> {
        let rtl = crate::script::contains_rtl_chars(text);
        let alignment = element.alignment.unwrap_or(if rtl {
            Alignment::Right
        } else {
            Alignment::Left
        });

        if let Err(e) = check_box(&element.bbox()) {
            log::warn!(
                "Page {}: {}, growing it to {:.1}pt",
                element.page_index + 1,
                e,
                self.options.min_box
            );
        }
        let bbox = element.bbox().with_min_size(self.options.min_box);
        let fit = self.fit(text, bbox.width(), bbox.height(), font, element.font_size);

        let (ox, oy) = page.origin;
        let left = bbox.x0 + ox;
        let right = bbox.x1 + ox;
        let top = oy + page.height - bbox.y0;
        let line_height = self.line_height(fit.font_size);

        fit.lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let width = self.metrics.text_width(&line, font, fit.font_size);
                let x = match alignment {
                    Alignment::Right => right - self.options.margin - width,
                    Alignment::Center => (left + right) / 2.0 - width / 2.0,
                    Alignment::Left => left + self.options.margin,
                };
                let y = top - fit.font_size - i as f32 * line_height;
                let shaped = if crate::script::contains_rtl_chars(&line) {
                    shape_for_display(&line)
                } else {
                    line.clone()
                };
                RenderedLine {
                    text: shaped,
                    logical: line,
                    x,
                    y,
                    width,
                    font_size: fit.font_size,
                    alignment,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::EstimateMetrics;

    /// Every char is `size * 0.5` wide.
    struct FixedMetrics;

    impl TextMeasure for FixedMetrics {
        fn text_width(&self, text: &str, _font: &str, size: f32) -> f32 {
            if text.trim().is_empty() {
                return 0.0;
            }
            text.chars().count() as f32 * size * 0.5
        }
    }

    fn fitter<'a>(options: &'a RenderOptions) -> TextFitter<'a, FixedMetrics> {
        TextFitter::new(&FixedMetrics, options)
    }

    #[test]
    fn test_fits_single_line() {
        let options = RenderOptions::default();
        let fit = fitter(&options).fit("Hello", 50.0, 20.0, "Any", 12.0);
        // 5 * 6 = 30 <= 46
        assert_eq!(fit.lines, vec!["Hello"]);
        assert_eq!(fit.font_size, 12.0);
    }

    #[test]
    fn test_fitting_text_with_line_breaks_stays_one_line() {
        let options = RenderOptions::default();
        let fit = fitter(&options).fit("Hi\nyo", 300.0, 100.0, "Any", 12.0);
        assert_eq!(fit.lines, vec!["Hi yo"]);
        assert_eq!(fit.font_size, 12.0);
    }

    #[test]
    fn test_fitting_text_keeps_large_original_size() {
        let options = RenderOptions::default();
        let fit = fitter(&options).fit("Hi", 1000.0, 200.0, "Any", 90.0);
        assert_eq!(fit.lines, vec!["Hi"]);
        assert_eq!(fit.font_size, 90.0);
    }

    #[test]
    fn test_oversized_text_shrinks_from_clamped_size() {
        let options = RenderOptions::default();
        let text = "aaaa bbbb cccc dddd";
        let fit = fitter(&options).fit(text, 100.0, 200.0, "Any", 90.0);
        assert!(fit.font_size <= 72.0);
        assert!(fit.lines.len() > 1);
    }

    #[test]
    fn test_wraps_words() {
        let options = RenderOptions::default();
        let f = fitter(&options);
        let lines = f.wrap("aaa bbb ccc", 46.0, "Any", 10.0);
        // "aaa bbb" = 35, "aaa bbb ccc" = 55
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_ltr_long_word_kept_whole() {
        let options = RenderOptions::default();
        let lines = fitter(&options).wrap("supercalifragilistic a", 20.0, "Any", 10.0);
        assert_eq!(lines, vec!["supercalifragilistic", "a"]);
    }

    #[test]
    fn test_shrinks_to_fit_height() {
        let options = RenderOptions::default();
        let f = fitter(&options);
        // 3x the usable width at 12pt, room for two 12pt lines only
        let text = "aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii";
        let max_width = f.max_width(100.0);
        let width = FixedMetrics.text_width(text, "Any", 12.0);
        assert!(width >= 2.5 * max_width);

        let fit = f.fit(text, 100.0, 29.0, "Any", 12.0);
        assert!(fit.font_size < 12.0);
        assert!(fit.font_size >= 6.0);
        assert!(!fit.lines.is_empty());
        let total = fit.lines.len() as f32 * fit.font_size * 1.2;
        assert!(total <= 29.0 || fit.font_size == 6.0);
    }

    #[test]
    fn test_floor_never_crossed() {
        let options = RenderOptions::default();
        let text = "word ".repeat(200);
        let fit = fitter(&options).fit(&text, 40.0, 12.0, "Any", 12.0);
        assert_eq!(fit.font_size, 6.0);
        assert!(fit.lines.len() > 1);
        // nothing dropped
        let joined = fit.lines.join(" ");
        assert_eq!(joined.split_whitespace().count(), 200);
    }

    #[test]
    fn test_deterministic() {
        let options = RenderOptions::default();
        let f = fitter(&options);
        let text = "The quick brown fox jumps over the lazy dog again and again";
        let first = f.fit(text, 80.0, 30.0, "Any", 14.0);
        for _ in 0..5 {
            assert_eq!(f.fit(text, 80.0, 30.0, "Any", 14.0), first);
        }
    }

    #[test]
    fn test_narrow_box_uses_fallback_width() {
        let options = RenderOptions::default().with_margin(20.0);
        let f = fitter(&options);
        assert_eq!(f.max_width(30.0), FALLBACK_WIDTH);
        let fit = f.fit("ab", 1.0, 1.0, "Any", 12.0);
        assert!(!fit.lines.is_empty());
    }

    #[test]
    fn test_rtl_character_accumulation() {
        let options = RenderOptions::default();
        let text = "\u{0633}\u{0644}\u{0627}\u{0645} \u{062F}\u{0646}\u{06CC}\u{0627}";
        // 9 chars * 5 = 45 at 10pt; 20 wide lines take 4 chars each
        let lines = fitter(&options).wrap(text, 20.0, "Any", 10.0);
        assert!(lines.len() >= 2);
        let rejoined: String = lines.concat();
        assert_eq!(
            rejoined.chars().filter(|c| !c.is_whitespace()).count(),
            8
        );
        for line in &lines {
            assert!(FixedMetrics.text_width(line, "Any", 10.0) <= 20.0);
        }
    }

    #[test]
    fn test_degenerate_box_recovered() {
        let flat = BBox::new(100.0, 100.0, 100.0, 100.0);
        assert!(matches!(check_box(&flat), Err(Error::Layout(_))));
        assert!(check_box(&BBox::new(0.0, 0.0, 10.0, 10.0)).is_ok());

        let options = RenderOptions::default();
        let f = TextFitter::new(&EstimateMetrics, &options);
        let element = TextElement::new("x", 0, flat, "Helvetica", 12.0);
        let lines = f.layout(&element, "Hi", "Helvetica", &PageInfo::letter());
        assert!(!lines.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let options = RenderOptions::default();
        let fit = fitter(&options).fit("  ", 100.0, 100.0, "Any", 12.0);
        assert!(fit.lines.is_empty());
    }

    #[test]
    fn test_layout_alignment() {
        let options = RenderOptions::default();
        let f = TextFitter::new(&EstimateMetrics, &options);
        let page = PageInfo::letter();
        let element = TextElement::new(
            "Hello",
            0,
            BBox::new(100.0, 100.0, 300.0, 120.0),
            "Helvetica",
            12.0,
        );

        let ltr = f.layout(&element, "Hi", "Helvetica", &page);
        assert_eq!(ltr.len(), 1);
        assert_eq!(ltr[0].alignment, Alignment::Left);
        assert_eq!(ltr[0].x, 102.0);
        assert_eq!(ltr[0].y, 792.0 - 100.0 - 12.0);

        let rtl = f.layout(&element, "\u{0633}\u{0644}\u{0627}\u{0645}", "Helvetica", &page);
        assert_eq!(rtl[0].alignment, Alignment::Right);
        assert!((rtl[0].x + rtl[0].width - 298.0).abs() < 1e-3);
        assert_ne!(rtl[0].text, "\u{0633}\u{0644}\u{0627}\u{0645}");

        let centered = element.clone().with_alignment(Alignment::Center);
        let c = f.layout(&centered, "Hi", "Helvetica", &page);
        assert!((c[0].x + c[0].width / 2.0 - 200.0).abs() < 1e-3);
    }
}
