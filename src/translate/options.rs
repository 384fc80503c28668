//! Translation run options.

use std::time::Duration;

use super::domain::Domain;
use super::retry::RetryPolicy;

/// Options for translating a document's elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    /// Elements per batch
    pub batch_size: usize,

    /// Retries after the first attempt of a request
    pub max_retries: u32,

    /// First backoff delay, doubled on each retry
    pub base_delay: Duration,

    /// Upper bound for a computed backoff delay
    pub max_delay: Duration,

    /// Request ceiling per sliding minute; 0 disables pacing
    pub requests_per_minute: u32,

    /// Timeout for a single backend request
    pub request_timeout: Duration,

    pub domain: Domain,

    /// Keep going when an element cannot be translated
    pub continue_on_error: bool,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// The backoff parameters of these options.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
        }
    }
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            requests_per_minute: 20,
            request_timeout: Duration::from_secs(60),
            domain: Domain::General,
            continue_on_error: false,
        }
    }
}
