//! Mock provider for tests and local development.
//!
//! Records every request it receives so tests can assert on exactly what was
//! sent upstream and how many times.

use super::{
    CompletionProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderError,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Echo a canned reply built from the user message.
    Echo,
    /// Reply with fixed text.
    Reply(String),
    /// Fail with the given provider error.
    Fail(MockFailure),
    /// Sleep before replying, to exercise timeouts.
    Delay(Duration, String),
}

#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    RateLimited,
    ApiError,
    Network,
    Malformed,
    ContentFiltered,
    NotConfigured,
}

impl MockFailure {
    fn to_error(self) -> ProviderError {
        match self {
            MockFailure::RateLimited => ProviderError::RateLimited {
                retry_after: Some(30),
            },
            MockFailure::ApiError => ProviderError::ApiError {
                status: 500,
                message: "upstream exploded: internal trace id 0xdeadbeef".to_string(),
            },
            MockFailure::Network => {
                ProviderError::NetworkError("connection reset by peer".to_string())
            }
            MockFailure::Malformed => {
                ProviderError::MalformedResponse("expected value at line 1".to_string())
            }
            MockFailure::ContentFiltered => ProviderError::ContentFiltered,
            MockFailure::NotConfigured => {
                ProviderError::NotConfigured("mock provider disabled".to_string())
            }
        }
    }
}

pub struct MockProvider {
    model: String,
    behavior: MockBehavior,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self::with_behavior(model, MockBehavior::Echo)
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_behavior("mock-tutor", MockBehavior::Reply(text.into()))
    }

    pub fn failing(failure: MockFailure) -> Self {
        Self::with_behavior("mock-tutor", MockBehavior::Fail(failure))
    }

    pub fn with_behavior(model: &str, behavior: MockBehavior) -> Self {
        Self {
            model: model.to_string(),
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    fn respond(text: String, request: &CompletionRequest) -> CompletionResponse {
        CompletionResponse {
            input_tokens: (request.system_prompt.len() + request.user_message.len()) as i32 / 4,
            output_tokens: text.len() as i32 / 4,
            text,
            finish_reason: FinishReason::Complete,
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        match &self.behavior {
            MockBehavior::Echo => Ok(Self::respond(
                format!("Mock response for: {}", request.user_message),
                request,
            )),
            MockBehavior::Reply(text) => Ok(Self::respond(text.clone(), request)),
            MockBehavior::Fail(failure) => Err(failure.to_error()),
            MockBehavior::Delay(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::respond(text.clone(), request))
            }
        }
    }

    fn health_check(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Fail(MockFailure::NotConfigured) => {
                Err(MockFailure::NotConfigured.to_error())
            }
            _ => Ok(()),
        }
    }
}
