//! Failure classification and retry with exponential backoff.

use std::sync::OnceLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;

use crate::error::{TranslationError, TranslationErrorKind};

use super::rate_limiter::{Clock, RateLimiter, Sleeper};

fn retry_after_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"retry_after(?:=|\s+)(\d+)",
            r"retry_delay\s*\{\s*seconds:\s*(\d+)\s*\}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Server retry hint in a backend message, in seconds.
pub fn parse_retry_after(message: &str) -> Option<Duration> {
    let lower = message.to_lowercase();
    retry_after_patterns().iter().find_map(|re| {
        re.captures(&lower)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(Duration::from_secs)
    })
}

/// Classify a backend failure message.
pub fn classify_error(message: &str) -> TranslationError {
    let lower = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["rate limit", "quota", "too many requests", "429"]) {
        let delay = parse_retry_after(&lower)
            .unwrap_or_else(|| TranslationErrorKind::RateLimit.default_delay());
        return TranslationError::rate_limit(message).with_retry_after(delay);
    }
    if has(&["auth", "api key", "permission", "unauthorized", "401", "403"]) {
        return TranslationError::authentication(message);
    }
    if has(&["connection", "timeout", "timed out", "network"]) {
        return TranslationError::connectivity(message);
    }
    if lower.contains("content") && has(&["filter", "policy", "block"]) {
        return TranslationError::content_filtered(message);
    }
    TranslationError::generic(message)
}

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Exponential backoff for the given 1-based failed attempt, with
    /// `jitter` as a fraction of the delay (clamped to 0..=0.3).
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let exp = attempt.saturating_sub(1).min(30);
        let delay = self.base_delay.as_secs_f64() * f64::from(1u32 << exp);
        let jittered = delay * (1.0 + jitter.clamp(0.0, 0.3));
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }

    /// Delay before retrying after `error`: the backoff, or the error's
    /// own hint when that is longer.
    pub fn delay_for(&self, attempt: u32, error: &TranslationError, jitter: f64) -> Duration {
        let backoff = self.backoff(attempt, jitter);
        let hint = error.retry_after.unwrap_or_else(|| error.kind.default_delay());
        backoff.max(hint)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Where a retried call stands.
#[derive(Debug, Clone, PartialEq)]
enum RetryState {
    /// About to make the given 1-based attempt
    Attempt(u32),
    /// The given attempt failed and will be retried after the delay
    Backoff { attempt: u32, delay: Duration },
}

/// Run `call` until it succeeds, fails permanently or exhausts the retry
/// budget. Every attempt is paced by `limiter` and recorded in it.
pub fn run_with_retry<T, F, C>(
    policy: &RetryPolicy,
    limiter: &mut RateLimiter,
    clock: &C,
    mut call: F,
) -> Result<T, TranslationError>
where
    F: FnMut() -> Result<T, TranslationError>,
    C: Clock + Sleeper + ?Sized,
{
    let mut state = RetryState::Attempt(1);
    loop {
        state = match state {
            RetryState::Attempt(attempt) => {
                limiter.wait_if_needed(clock);
                let result = call();
                limiter.record_request(clock.now());
                match result {
                    Ok(value) => return Ok(value),
                    Err(error) if !error.is_retryable() => {
                        log::error!("Attempt {} failed permanently: {}", attempt, error);
                        return Err(error);
                    }
                    Err(error) if attempt > policy.max_retries => {
                        log::error!("Giving up after {} attempts: {}", attempt, error);
                        return Err(error);
                    }
                    Err(error) => {
                        let jitter = rand::thread_rng().gen_range(0.0..=0.3);
                        let delay = policy.delay_for(attempt, &error, jitter);
                        log::warn!(
                            "Attempt {}/{} failed: {}. Retrying in {:.1}s",
                            attempt,
                            policy.max_retries + 1,
                            error,
                            delay.as_secs_f64()
                        );
                        RetryState::Backoff { attempt, delay }
                    }
                }
            }
            RetryState::Backoff { attempt, delay } => {
                clock.sleep(delay);
                RetryState::Attempt(attempt + 1)
            }
        };
    }
}
