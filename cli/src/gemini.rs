//! Gemini `generateContent` translation backend.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use transpdf::translate::{classify_error, clean_response};
use transpdf::{TranslationError, Translator};

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
struct Request<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    status: Option<String>,
}

/// A failed request: either the model is unknown to the service or a
/// classified error.
#[derive(Debug)]
enum Failure {
    ModelNotFound(TranslationError),
    Failed(TranslationError),
}

/// Translator calling the Gemini REST API.
///
/// Requests run on a private current-thread runtime so the library can
/// stay synchronous.
pub struct GeminiTranslator {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    api_key: String,
    model: String,
    fallback_model: Option<String>,
}

impl GeminiTranslator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            api_key: api_key.into(),
            model: model.into(),
            fallback_model: None,
        })
    }

    /// Model to retry with when the primary model does not exist.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.fallback_model = (!model.is_empty() && model != self.model).then_some(model);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, Failure> {
        let url = format!("{}/{}:generateContent", ENDPOINT, model);
        let body = serde_json::to_vec(&Request {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        })
        .map_err(|e| Failure::Failed(TranslationError::generic(e.to_string())))?;

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Failure::Failed(transport_error(&e)))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let text = response
            .text()
            .await
            .map_err(|e| Failure::Failed(transport_error(&e)))?;

        if !status.is_success() {
            let mut error = status_error(status, &text);
            if let Some(delay) = retry_after {
                error = error.with_retry_after(delay);
            }
            return Err(if status == StatusCode::NOT_FOUND {
                Failure::ModelNotFound(error)
            } else {
                Failure::Failed(error)
            });
        }
        reply_text(&text).map_err(Failure::Failed)
    }
}

impl Translator for GeminiTranslator {
    fn translate(&self, _text: &str, prompt: &str) -> Result<String, TranslationError> {
        let reply = match self.runtime.block_on(self.generate(&self.model, prompt)) {
            Ok(reply) => reply,
            Err(Failure::ModelNotFound(error)) => match &self.fallback_model {
                Some(fallback) => {
                    log::warn!("Model {} not found, using {}", self.model, fallback);
                    match self.runtime.block_on(self.generate(fallback, prompt)) {
                        Ok(reply) => reply,
                        Err(Failure::ModelNotFound(e) | Failure::Failed(e)) => return Err(e),
                    }
                }
                None => return Err(error),
            },
            Err(Failure::Failed(error)) => return Err(error),
        };
        Ok(clean_response(&reply))
    }
}

fn transport_error(error: &reqwest::Error) -> TranslationError {
    if error.is_timeout() {
        TranslationError::connectivity(format!("request timed out: {}", error))
    } else if error.is_connect() {
        TranslationError::connectivity(format!("connection failed: {}", error))
    } else {
        classify_error(&error.to_string())
    }
}

/// Classify a non-success response from its status and error body.
fn status_error(status: StatusCode, body: &str) -> TranslationError {
    let detail = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(s) => format!("{} ({})", parsed.error.message, s),
            None => parsed.error.message,
        },
        Err(_) => body.trim().to_string(),
    };
    let message = format!("{} {}", status.as_u16(), detail);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranslationError::authentication(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            TranslationError::connectivity(message)
        }
        _ => classify_error(&message),
    }
}

/// Text of the first candidate of a successful response.
fn reply_text(body: &str) -> Result<String, TranslationError> {
    let response: Response = serde_json::from_str(body)
        .map_err(|e| TranslationError::generic(format!("malformed response: {}", e)))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(TranslationError::content_filtered(format!(
            "content blocked by safety filter: {}",
            reason
        )));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(TranslationError::generic("empty response from model"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use transpdf::TranslationErrorKind;

    #[test]
    fn test_reply_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"سلام"},{"text":" دنیا"}],"role":"model"}}]}"#;
        assert_eq!(reply_text(body).unwrap(), "سلام دنیا");
    }

    #[test]
    fn test_reply_blocked() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = reply_text(body).unwrap_err();
        assert_eq!(err.kind, TranslationErrorKind::ContentFiltered);
    }

    #[test]
    fn test_reply_empty() {
        let err = reply_text(r#"{"candidates":[]}"#).unwrap_err();
        assert_eq!(err.kind, TranslationErrorKind::Generic);
        assert!(reply_text("not json").is_err());
    }

    #[test]
    fn test_status_errors() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(err.kind, TranslationErrorKind::RateLimit);
        assert!(err.message.contains("Resource has been exhausted"));

        let err = status_error(StatusCode::FORBIDDEN, "denied");
        assert_eq!(err.kind, TranslationErrorKind::Authentication);

        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        let err = status_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, TranslationErrorKind::Authentication);

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert_eq!(err.kind, TranslationErrorKind::Generic);
    }

    #[test]
    fn test_fallback_model_ignored_when_same() {
        let translator = GeminiTranslator::new("key", "gemini-1.5-pro", Duration::from_secs(5))
            .unwrap()
            .with_fallback_model("gemini-1.5-pro");
        assert!(translator.fallback_model.is_none());
        assert_eq!(translator.model(), "gemini-1.5-pro");
    }
}
