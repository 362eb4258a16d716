//! The tutoring request pipeline.
//!
//! One request is validated, assigned a phase, turned into a system prompt
//! and a user message, and sent upstream exactly once under a timeout.

use crate::config::GenerationConfig;
use crate::models::{next_phase, AskRequest, AskResponse, Mode, TransitionError};
use crate::prompts;
use crate::services::metrics;
use crate::services::providers::{
    CompletionProvider, CompletionRequest, FinishReason, GenerationParams, ProviderError,
};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Credit awarded for every answered request.
pub const PROGRESS_BOOST: u32 = 5;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("user_query cannot be empty")]
    EmptyQuestion,

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("completion provider timed out")]
    UpstreamTimeout,

    #[error("completion provider unavailable: {0}")]
    UpstreamUnavailable(ProviderError),

    #[error("completion provider request failed: {0}")]
    UpstreamProtocol(ProviderError),
}

impl TutorError {
    pub fn kind(&self) -> &'static str {
        match self {
            TutorError::EmptyQuestion => "empty_question",
            TutorError::InvalidTransition(_) => "invalid_transition",
            TutorError::UpstreamTimeout => "upstream_timeout",
            TutorError::UpstreamUnavailable(_) => "upstream_unavailable",
            TutorError::UpstreamProtocol(_) => "upstream_protocol",
        }
    }
}

impl From<ProviderError> for TutorError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout => TutorError::UpstreamTimeout,
            ProviderError::RateLimited { .. } | ProviderError::NotConfigured(_) => {
                TutorError::UpstreamUnavailable(err)
            }
            ProviderError::ApiError { .. }
            | ProviderError::ContentFiltered
            | ProviderError::NetworkError(_)
            | ProviderError::MalformedResponse(_) => TutorError::UpstreamProtocol(err),
        }
    }
}

/// Provider details stay in the logs; callers only see a fixed message.
impl From<TutorError> for AppError {
    fn from(err: TutorError) -> Self {
        match err {
            TutorError::EmptyQuestion => {
                AppError::BadRequest(anyhow::anyhow!("user_query cannot be empty"))
            }
            TutorError::InvalidTransition(e) => AppError::Conflict(anyhow::anyhow!(e.to_string())),
            TutorError::UpstreamTimeout => {
                AppError::GatewayTimeout("Upstream completion provider timed out".to_string())
            }
            TutorError::UpstreamUnavailable(e) => {
                let retry_after = match e {
                    ProviderError::RateLimited { retry_after } => retry_after,
                    _ => None,
                };
                AppError::ServiceUnavailable(
                    "Upstream completion provider is temporarily unavailable".to_string(),
                    retry_after,
                )
            }
            TutorError::UpstreamProtocol(_) => {
                AppError::BadGateway("Upstream completion provider request failed".to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct TutorService {
    provider: Arc<dyn CompletionProvider>,
    generation: GenerationConfig,
}

impl TutorService {
    pub fn new(provider: Arc<dyn CompletionProvider>, generation: GenerationConfig) -> Self {
        Self {
            provider,
            generation,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    #[tracing::instrument(
        skip(self, request),
        fields(mode, phase, question_len = request.user_query.len())
    )]
    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse, TutorError> {
        let start = Instant::now();
        let mode = request.resolved_mode();
        tracing::Span::current().record("mode", mode.as_str());

        let result = self.answer(request, mode).await;

        let (phase, outcome) = match &result {
            Ok(response) => (response.phase.as_str(), "ok"),
            Err(e) => ("none", e.kind()),
        };
        metrics::record_tutor_request(
            mode.as_str(),
            phase,
            outcome,
            start.elapsed().as_secs_f64(),
        );

        result
    }

    async fn answer(&self, request: &AskRequest, mode: Mode) -> Result<AskResponse, TutorError> {
        if request.user_query.trim().is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        let turn = request.turn.unwrap_or_default();
        let phase = next_phase(request.phase, turn, mode).map_err(|e| {
            tracing::info!(error = %e, turn = turn.as_str(), "Rejected phase transition");
            e
        })?;
        tracing::Span::current().record("phase", phase.as_str());

        let completion = CompletionRequest {
            system_prompt: prompts::system_prompt(mode, phase),
            user_message: prompts::user_message(&request.user_query, request.history.as_deref()),
            params: GenerationParams {
                temperature: Some(self.generation.temperature),
                max_tokens: Some(self.generation.max_tokens),
            },
        };

        let text = self.complete_once(&completion).await?;

        Ok(AskResponse {
            answer: text,
            citation: prompts::citation(mode).to_string(),
            progress_boost: PROGRESS_BOOST,
            mode,
            phase,
        })
    }

    /// One upstream call, bounded by the configured timeout. Dropping the
    /// returned future cancels the in-flight HTTP request.
    async fn complete_once(&self, completion: &CompletionRequest) -> Result<String, TutorError> {
        let provider = self.provider.name();
        let model = self.provider.model();
        let timeout = self.generation.upstream_timeout();

        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.provider.complete(completion)).await;
        metrics::record_provider_latency(provider, model, started.elapsed().as_secs_f64());

        let response = match outcome {
            Err(_) => {
                metrics::record_provider_error(provider, "timeout");
                tracing::warn!(
                    provider,
                    model,
                    timeout_secs = timeout.as_secs(),
                    "Completion provider timed out"
                );
                return Err(TutorError::UpstreamTimeout);
            }
            Ok(Err(e)) => {
                metrics::record_provider_error(provider, e.kind());
                tracing::error!(provider, model, error = %e, "Completion provider call failed");
                return Err(e.into());
            }
            Ok(Ok(response)) => response,
        };

        if response.finish_reason == FinishReason::Length {
            tracing::warn!(
                provider,
                model,
                output_tokens = response.output_tokens,
                "Completion truncated at max tokens"
            );
        }
        metrics::record_tokens(model, response.input_tokens, response.output_tokens);

        tracing::info!(
            provider,
            model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = response.finish_reason.as_str(),
            "Completion received"
        );

        Ok(response.text)
    }
}
