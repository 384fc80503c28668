//! Batch translation of text elements.

use crate::error::{Error, Result, TranslationError};
use crate::model::TextElement;

use super::options::TranslateOptions;
use super::rate_limiter::{Clock, RateLimiter, Sleeper, SystemClock};
use super::retry::{run_with_retry, RetryPolicy};
use super::text::clean_text_for_translation;
use super::Translator;

/// Outcome of translating a list of elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationReport {
    pub translated: usize,
    /// Elements with no text to translate
    pub skipped: usize,
    pub failed: usize,
    /// Failures tolerated under continue-on-error, by element index
    pub errors: Vec<(usize, TranslationError)>,
}

impl TranslationReport {
    pub fn total(&self) -> usize {
        self.translated + self.skipped + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Progress callback receiving `(done, total)`.
pub type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + 'a>;

/// Drives a [`Translator`] over text elements with pacing and retries.
pub struct Orchestrator<'a, T: Translator + ?Sized, C = SystemClock> {
    translator: &'a T,
    options: TranslateOptions,
    policy: RetryPolicy,
    limiter: RateLimiter,
    clock: C,
    progress: Option<ProgressFn<'a>>,
}

impl<'a, T: Translator + ?Sized> Orchestrator<'a, T, SystemClock> {
    pub fn new(translator: &'a T, options: TranslateOptions) -> Self {
        Self::with_clock(translator, options, SystemClock)
    }
}

impl<'a, T: Translator + ?Sized, C: Clock + Sleeper> Orchestrator<'a, T, C> {
    /// An orchestrator pacing itself on `clock`.
    pub fn with_clock(translator: &'a T, options: TranslateOptions, clock: C) -> Self {
        Self {
            translator,
            policy: options.retry_policy(),
            limiter: RateLimiter::new(options.requests_per_minute),
            options,
            clock,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: impl FnMut(usize, usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Translate one text. Blank input is not sent and yields an empty
    /// string.
    pub fn translate_text(&mut self, text: &str) -> std::result::Result<String, TranslationError> {
        let cleaned = clean_text_for_translation(text);
        if cleaned.is_empty() {
            return Ok(String::new());
        }
        let prompt = self.options.domain.prompt(&cleaned);
        let translator = self.translator;
        run_with_retry(&self.policy, &mut self.limiter, &self.clock, || {
            translator.translate(&cleaned, &prompt)
        })
    }

    /// Translate `elements` in batches, setting each translation in place.
    ///
    /// Without continue-on-error the first failure aborts the run. With it,
    /// failed elements keep their original text and stay incomplete.
    pub fn translate_elements(&mut self, elements: &mut [TextElement]) -> Result<TranslationReport> {
        let total = elements.len();
        let batch_size = self.options.batch_size.max(1);
        let batches = total.div_ceil(batch_size);
        let mut report = TranslationReport::default();

        log::info!(
            "Translating {} elements in batches of {} ({} domain)",
            total,
            batch_size,
            self.options.domain
        );

        for (batch_index, batch) in elements.chunks_mut(batch_size).enumerate() {
            for (offset, element) in batch.iter_mut().enumerate() {
                let index = batch_index * batch_size + offset;
                match self.translate_text(&element.text) {
                    Ok(translated) if translated.trim().is_empty() => {
                        log::debug!("Element {} has nothing to translate", index);
                        report.skipped += 1;
                    }
                    Ok(translated) => {
                        element.set_translation(translated);
                        report.translated += 1;
                    }
                    Err(e) if self.options.continue_on_error => {
                        log::error!("Element {} left untranslated: {}", index, e);
                        report.failed += 1;
                        report.errors.push((index, e));
                    }
                    Err(e) => return Err(Error::Translation(e)),
                }
                if let Some(progress) = self.progress.as_mut() {
                    progress(index + 1, total);
                }
            }
            log::info!("Translated batch {}/{}", batch_index + 1, batches);
        }

        Ok(report)
    }
}
