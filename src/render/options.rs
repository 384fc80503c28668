//! Text layer rendering options.

use crate::model::Color;

/// Options for fitting and drawing translated text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Inner margin kept on each side of an element box
    pub margin: f32,

    /// Line height as a multiple of the font size
    pub line_height_ratio: f32,

    /// Smallest font size the fitter may shrink to
    pub min_font_size: f32,

    /// Largest font size drawn
    pub max_font_size: f32,

    /// Factor applied to the font size on each shrink step
    pub shrink_factor: f32,

    /// Minimum width and height of an element box
    pub min_box: f32,

    /// Draw the original text for elements without a translation
    pub partial: bool,

    /// Color for all drawn text, overriding element colors
    pub text_color: Option<Color>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    pub fn with_line_height(mut self, ratio: f32) -> Self {
        self.line_height_ratio = ratio;
        self
    }

    /// Set the font size bounds. The bounds are swapped if reversed.
    pub fn with_font_size_range(mut self, min: f32, max: f32) -> Self {
        self.min_font_size = min.min(max);
        self.max_font_size = min.max(max);
        self
    }

    /// Enable or disable partial mode.
    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self
    }

    /// Clamp a font size into the configured range.
    pub fn clamp_font_size(&self, size: f32) -> f32 {
        if size.is_finite() {
            size.clamp(self.min_font_size, self.max_font_size)
        } else {
            self.min_font_size.max(12.0).min(self.max_font_size)
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            margin: 2.0,
            line_height_ratio: 1.2,
            min_font_size: 6.0,
            max_font_size: 72.0,
            shrink_factor: 0.9,
            min_box: 10.0,
            partial: false,
            text_color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.margin, 2.0);
        assert_eq!(options.line_height_ratio, 1.2);
        assert_eq!(options.min_font_size, 6.0);
        assert!(!options.partial);
    }

    #[test]
    fn test_clamp_font_size() {
        let options = RenderOptions::default();
        assert_eq!(options.clamp_font_size(3.0), 6.0);
        assert_eq!(options.clamp_font_size(100.0), 72.0);
        assert_eq!(options.clamp_font_size(11.0), 11.0);
        assert_eq!(options.clamp_font_size(f32::NAN), 12.0);
    }

    #[test]
    fn test_builder() {
        let options = RenderOptions::new()
            .with_font_size_range(20.0, 8.0)
            .with_partial(true)
            .with_margin(-1.0);
        assert_eq!(options.min_font_size, 8.0);
        assert_eq!(options.max_font_size, 20.0);
        assert!(options.partial);
        assert_eq!(options.margin, 0.0);
    }
}
