//! Translation of text elements through a pluggable backend.
//!
//! The backend only turns a prompt into a reply. Pacing, retries and
//! attaching results to elements happen in the [`Orchestrator`].

mod domain;
mod options;
mod orchestrator;
mod rate_limiter;
mod retry;
mod text;

pub use domain::Domain;
pub use options::TranslateOptions;
pub use orchestrator::{Orchestrator, ProgressFn, TranslationReport};
pub use rate_limiter::{Clock, ManualClock, RateLimiter, Sleeper, SystemClock};
pub use retry::{classify_error, parse_retry_after, run_with_retry, RetryPolicy};
pub use text::{clean_response, clean_text_for_translation};

use crate::error::TranslationError;

/// A text translation service.
pub trait Translator {
    /// Translate `text`. `prompt` is the full instruction for the backend,
    /// already containing the text.
    fn translate(&self, text: &str, prompt: &str) -> Result<String, TranslationError>;
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(&self, text: &str, prompt: &str) -> Result<String, TranslationError> {
        (**self).translate(text, prompt)
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn translate(&self, text: &str, prompt: &str) -> Result<String, TranslationError> {
        (**self).translate(text, prompt)
    }
}

/// Offline translator producing one Persian placeholder word per source
/// word, for exercising layout without a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyTranslator;

impl DummyTranslator {
    const WORD: &'static str = "\u{0648}\u{0627}\u{0698}\u{0647}";
}

impl Translator for DummyTranslator {
    fn translate(&self, text: &str, _prompt: &str) -> Result<String, TranslationError> {
        Ok(text
            .split_whitespace()
            .map(|_| Self::WORD)
            .collect::<Vec<_>>()
            .join(" "))
    }
}
