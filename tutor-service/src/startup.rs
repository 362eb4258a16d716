//! Application startup and lifecycle management.

use crate::config::TutorConfig;
use crate::handlers::{ask, health};
use crate::services::providers::{self, CompletionProvider};
use crate::services::TutorService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{http_trace_layer, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: TutorConfig,
    pub tutor: TutorService,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_check))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route("/ask", post(ask::ask))
        .route("/chat", post(ask::ask))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
        .layer(http_trace_layer())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the provider selected in configuration.
    pub async fn build(config: TutorConfig) -> Result<Self, AppError> {
        let provider =
            providers::from_config(&config.provider, config.generation.upstream_timeout())
                .map_err(|e| {
                    tracing::error!("Failed to initialize completion provider: {}", e);
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?;

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            "Initialized completion provider"
        );

        Self::build_with_provider(config, provider).await
    }

    /// Build the application around an existing provider.
    pub async fn build_with_provider(
        config: TutorConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self, AppError> {
        if let Err(e) = provider.health_check() {
            tracing::warn!(provider = provider.name(), error = %e, "Completion provider not ready");
        }

        let tutor = TutorService::new(provider, config.generation.clone());
        let state = AppState {
            config: config.clone(),
            tutor,
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!("Tutor service listening on port {}", http_port);

        Ok(Self {
            http_port,
            listener,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
