#![allow(dead_code)]

use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Once};
use tutor_service::config::{GenerationConfig, ProviderConfig, ProviderKind, TutorConfig};
use tutor_service::services::init_metrics;
use tutor_service::services::providers::mock::MockProvider;
use tutor_service::startup::Application;

static INIT_METRICS: Once = Once::new();

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

/// Configuration pointing at `kind`, with a random port.
pub fn test_config(kind: ProviderKind, base_url: &str) -> TutorConfig {
    TutorConfig {
        common: CoreConfig { port: 0 },
        provider: ProviderConfig {
            kind,
            api_key: Secret::new("test-api-key".to_string()),
            model: "test-model".to_string(),
            base_url: base_url.to_string(),
        },
        generation: GenerationConfig::default(),
    }
}

impl TestApp {
    /// Spawn the service around a mock provider the test keeps a handle to.
    pub async fn spawn(provider: Arc<MockProvider>) -> Self {
        INIT_METRICS.call_once(init_metrics);

        let config = test_config(ProviderKind::Mock, "");
        let app = Application::build_with_provider(config, provider)
            .await
            .expect("Failed to build test application");

        Self::start(app).await
    }

    /// Spawn the service with the provider built from `config`.
    pub async fn spawn_with_config(config: TutorConfig) -> Self {
        INIT_METRICS.call_once(init_metrics);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        Self::start(app).await
    }

    async fn start(app: Application) -> Self {
        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
