//! Font registration and text measurement.

mod registry;
mod standard;

pub use registry::{FontChoice, FontFace, FontRegistry, FontVariant, BUILTIN_FONT};
pub use standard::{helvetica_advance, is_helvetica_like};

use crate::script::contains_rtl_chars;

/// Width ratio of an average Arabic-script glyph to the font size.
pub const RTL_WIDTH_RATIO: f32 = 0.7;
/// Width ratio of an average glyph of any other script to the font size.
pub const LTR_WIDTH_RATIO: f32 = 0.6;

/// Measures rendered text width.
pub trait TextMeasure {
    /// Width of `text` drawn in `font` at `size` points; never negative and
    /// `0` for blank input.
    fn text_width(&self, text: &str, font: &str, size: f32) -> f32;
}

/// Fixed-ratio width estimate used when no metrics are available.
pub fn estimate_width(text: &str, size: f32) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let ratio = if contains_rtl_chars(text) {
        RTL_WIDTH_RATIO
    } else {
        LTR_WIDTH_RATIO
    };
    text.chars().count() as f32 * size * ratio
}

/// Width in the built-in Helvetica; chars outside its table are estimated.
pub fn builtin_width(text: &str, size: f32) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    text.chars()
        .map(|c| match helvetica_advance(c) {
            Some(advance) => advance as f32 * size / 1000.0,
            None => estimate_width(&c.to_string(), size),
        })
        .sum()
}

/// Measurement by estimate only.
#[derive(Debug, Default, Clone, Copy)]
pub struct EstimateMetrics;

impl TextMeasure for EstimateMetrics {
    fn text_width(&self, text: &str, _font: &str, size: f32) -> f32 {
        estimate_width(text, size)
    }
}
