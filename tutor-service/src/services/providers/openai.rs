//! OpenAI-compatible chat completions provider.
//!
//! Works against any endpoint that implements `POST {base_url}/chat/completions`
//! (OpenAI, Groq, Together, a local vLLM, ...).

use super::{
    build_client, error_from_response, CompletionProvider, CompletionRequest, CompletionResponse,
    FinishReason, ProviderError,
};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn from_provider_config(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            config,
            client: build_client(timeout)?,
        })
    }

    fn to_chat_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.config.base_url);

        tracing::debug!(
            model = %self.config.model,
            system_len = request.system_prompt.len(),
            message_len = request.user_message.len(),
            "Sending request to chat completions API"
        );

        let response = self
            .client
            .traced_post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.without_url().to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("response had no choices".into()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Complete,
        };

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let text = choice
            .message
            .content
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse("choice contained no text".into()))?;

        let usage = api_response.usage.unwrap_or_default();

        Ok(CompletionResponse {
            text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason,
        })
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i32,
    #[serde(default)]
    completion_tokens: i32,
}
