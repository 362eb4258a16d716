//! Completion provider abstractions and implementations.
//!
//! The tutor talks to one hosted LLM through the [`CompletionProvider`] trait,
//! so the backend (Gemini, an OpenAI-compatible API, or the mock used in
//! tests) is chosen once at startup.

pub mod gemini;
pub mod mock;
pub mod openai;

use crate::config::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::Timeout => "timeout",
            ProviderError::NetworkError(_) => "network",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }

    /// The URL is stripped first: it may carry credentials.
    fn from_transport(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::MalformedResponse(err.to_string())
        } else {
            ProviderError::NetworkError(err.to_string())
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
        }
    }
}

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,
}

/// One system prompt plus one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub params: GenerationParams,
}

/// Result of a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text, exactly as returned.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    pub finish_reason: FinishReason,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier sent upstream.
    fn model(&self) -> &str;

    /// Issue exactly one completion call.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Cheap local check that the provider can be called at all.
    fn health_check(&self) -> Result<(), ProviderError>;
}

/// Build the provider selected in configuration.
///
/// `timeout` also bounds the HTTP client so an abandoned connection cannot
/// outlive the request that opened it.
pub fn from_config(
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let provider: Arc<dyn CompletionProvider> = match config.kind {
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(
            gemini::GeminiConfig::from_provider_config(config),
            timeout,
        )?),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::new(
            openai::OpenAiConfig::from_provider_config(config),
            timeout,
        )?),
        ProviderKind::Mock => Arc::new(mock::MockProvider::new(&config.model)),
    };

    Ok(provider)
}

/// Parse `Retry-After` given in whole seconds.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Map a non-success status to a provider error. The body is kept for logs only.
async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let retry_after = retry_after_secs(response.headers());
    let error_text = response.text().await.unwrap_or_default();

    if status.as_u16() == 429 {
        return ProviderError::RateLimited { retry_after };
    }

    ProviderError::ApiError {
        status: status.as_u16(),
        message: error_text,
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn provider_config(kind: ProviderKind, api_key: &str) -> ProviderConfig {
        ProviderConfig {
            kind,
            api_key: Secret::new(api_key.to_string()),
            model: "test-model".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        }
    }

    #[test]
    fn builds_each_configured_provider() {
        let timeout = Duration::from_secs(5);

        let gemini = from_config(&provider_config(ProviderKind::Gemini, "k"), timeout).unwrap();
        assert_eq!(gemini.name(), "gemini");
        assert_eq!(gemini.model(), "test-model");

        let openai = from_config(&provider_config(ProviderKind::OpenAi, "k"), timeout).unwrap();
        assert_eq!(openai.name(), "openai");

        let mock = from_config(&provider_config(ProviderKind::Mock, ""), timeout).unwrap();
        assert_eq!(mock.name(), "mock");
        assert!(mock.health_check().is_ok());
    }

    #[test]
    fn missing_api_key_fails_health_check() {
        let provider =
            from_config(&provider_config(ProviderKind::OpenAi, ""), Duration::from_secs(5))
                .unwrap();
        assert!(matches!(
            provider.health_check(),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "12".parse().unwrap());
        assert_eq!(retry_after_secs(&headers), Some(12));

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2026 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(retry_after_secs(&headers), None);
    }
}
