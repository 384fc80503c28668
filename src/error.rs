//! Error types for transpdf library.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for transpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while translating a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and requires a password.
    #[error("Document is encrypted")]
    Encrypted,

    /// A malformed element box.
    #[error("Layout error: {0}")]
    Layout(String),

    /// The composite of one page failed; the document cannot be produced.
    #[error("Composition of page {page} failed: {message}")]
    Composition { page: usize, message: String },

    /// A font file could not be read or parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// A classified failure from the translation backend.
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a page composite failure.
    pub fn composition(page: usize, message: impl Into<String>) -> Self {
        Error::Composition {
            page,
            message: message.into(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

/// Category of a translation backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationErrorKind {
    /// Quota or request-rate exhaustion.
    RateLimit,
    /// Missing, invalid or unauthorized credentials.
    Authentication,
    /// Network failures and timeouts.
    Connectivity,
    /// The backend refused the content.
    ContentFiltered,
    /// Anything else.
    Generic,
}

impl TranslationErrorKind {
    /// Whether a failure of this kind is worth another attempt.
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            TranslationErrorKind::Authentication | TranslationErrorKind::ContentFiltered
        )
    }

    /// Delay used when the backend gave no hint.
    pub fn default_delay(self) -> Duration {
        match self {
            TranslationErrorKind::RateLimit => Duration::from_secs(60),
            TranslationErrorKind::Connectivity => Duration::from_secs(5),
            TranslationErrorKind::Generic => Duration::from_secs(2),
            TranslationErrorKind::Authentication | TranslationErrorKind::ContentFiltered => {
                Duration::ZERO
            }
        }
    }
}

impl fmt::Display for TranslationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TranslationErrorKind::RateLimit => "rate limit",
            TranslationErrorKind::Authentication => "authentication",
            TranslationErrorKind::Connectivity => "connectivity",
            TranslationErrorKind::ContentFiltered => "content filtered",
            TranslationErrorKind::Generic => "translation",
        };
        f.write_str(name)
    }
}

/// A translation failure together with its classification.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} error: {message}")]
pub struct TranslationError {
    pub kind: TranslationErrorKind,
    pub message: String,
    /// Server supplied hint for when to try again.
    pub retry_after: Option<Duration>,
}

impl TranslationError {
    pub fn new(kind: TranslationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(TranslationErrorKind::RateLimit, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(TranslationErrorKind::Authentication, message)
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(TranslationErrorKind::Connectivity, message)
    }

    pub fn content_filtered(message: impl Into<String>) -> Self {
        Self::new(TranslationErrorKind::ContentFiltered, message)
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(TranslationErrorKind::Generic, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
