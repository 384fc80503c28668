//! Script classification and display shaping for right-to-left text.
//!
//! Classification is a fast Unicode-range check with a length-gated
//! fallback to a [`LanguageDetector`]. Shaping lives in [`shaping`].

mod shaping;

pub use shaping::{shape_for_display, visual_runs};

use unicode_bidi::{bidi_class, BidiClass};

/// Strings longer than this (in chars) consult the detector when no
/// Arabic-script character is present.
const DETECTOR_MIN_CHARS: usize = 20;

/// Arabic, Arabic Supplement, Arabic Extended-A and the two presentation
/// forms blocks.
const RTL_RANGES: &[(u32, u32)] = &[
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

/// Whether a character falls in one of the Arabic-script blocks.
pub fn is_rtl_char(c: char) -> bool {
    let cp = c as u32;
    RTL_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// Whether any character of `text` is in an Arabic-script block.
pub fn contains_rtl_chars(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

/// Best-effort direction detector used when the range check is inconclusive.
pub trait LanguageDetector: Send + Sync {
    /// `Some(true)` for right-to-left text, `None` when undecidable.
    fn detect_rtl(&self, text: &str) -> Option<bool>;
}

/// Detector that weighs strong bidi classes: right-to-left when strong
/// R/AL characters outnumber strong L characters.
///
/// Catches Hebrew, Syriac, Thaana and other RTL scripts that are outside
/// the Arabic ranges.
#[derive(Debug, Default, Clone, Copy)]
pub struct BidiClassDetector;

impl LanguageDetector for BidiClassDetector {
    fn detect_rtl(&self, text: &str) -> Option<bool> {
        let (mut rtl, mut ltr) = (0usize, 0usize);
        for c in text.chars() {
            match bidi_class(c) {
                BidiClass::R | BidiClass::AL => rtl += 1,
                BidiClass::L => ltr += 1,
                _ => {}
            }
        }
        if rtl + ltr == 0 {
            None
        } else {
            Some(rtl > ltr)
        }
    }
}

/// Decides whether text is right-to-left.
pub struct ScriptClassifier {
    detector: Box<dyn LanguageDetector>,
}

impl ScriptClassifier {
    pub fn new(detector: Box<dyn LanguageDetector>) -> Self {
        Self { detector }
    }

    /// Range check first, then the detector for long strings. Detector
    /// failure counts as left-to-right.
    pub fn is_rtl(&self, text: &str) -> bool {
        if contains_rtl_chars(text) {
            return true;
        }
        if text.chars().count() <= DETECTOR_MIN_CHARS {
            return false;
        }
        self.detector.detect_rtl(text).unwrap_or(false)
    }
}

impl Default for ScriptClassifier {
    fn default() -> Self {
        Self::new(Box::new(BidiClassDetector))
    }
}

impl std::fmt::Debug for ScriptClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptClassifier").finish_non_exhaustive()
    }
}

/// [`ScriptClassifier::is_rtl`] with the default detector.
pub fn is_rtl_script(text: &str) -> bool {
    ScriptClassifier::default().is_rtl(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl LanguageDetector for Failing {
        fn detect_rtl(&self, _text: &str) -> Option<bool> {
            None
        }
    }

    #[test]
    fn test_arabic_block_is_rtl() {
        assert!(is_rtl_script("سلام"));
        assert!(is_rtl_script("Version 2 \u{0627}"));
        assert!(is_rtl_script("\u{FEFB}"));
        assert!(is_rtl_script("\u{08A0}"));
    }

    #[test]
    fn test_latin_is_not_rtl() {
        assert!(!is_rtl_script(""));
        assert!(!is_rtl_script("Hello world"));
        assert!(!is_rtl_script("12345"));
    }

    #[test]
    fn test_detector_failure_is_false() {
        let classifier = ScriptClassifier::new(Box::new(Failing));
        assert!(!classifier.is_rtl("a fairly long string with no arabic in it"));
        assert!(classifier.is_rtl("short \u{0645}"));
    }

    #[test]
    fn test_short_strings_skip_detector() {
        struct AlwaysRtl;
        impl LanguageDetector for AlwaysRtl {
            fn detect_rtl(&self, _text: &str) -> Option<bool> {
                Some(true)
            }
        }
        let classifier = ScriptClassifier::new(Box::new(AlwaysRtl));
        assert!(!classifier.is_rtl("tiny"));
    }
}
