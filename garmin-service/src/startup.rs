//! Application startup and lifecycle management.
//!
//! Builds the HTTP router (Garmin proxy endpoints plus health/metrics) and
//! owns the listener until shutdown.

use crate::config::GarminServiceConfig;
use crate::handlers::{
    garmin_login, garmin_resume_login, get_body_composition, get_daily_summary, health_check,
    metrics::metrics, read_root, readiness_check,
};
use crate::services::{ConnectClient, GarminClient, MockGarminClient};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GarminServiceConfig,
    pub garmin: Arc<dyn GarminClient>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/auth/garmin/login", post(garmin_login))
        .route("/auth/garmin/resume_login", post(garmin_resume_login))
        .route("/data/daily_summary", post(get_daily_summary))
        .route("/data/body_composition", post(get_body_composition))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Pick the Garmin client implementation from configuration.
pub fn garmin_client_from_config(
    config: &GarminServiceConfig,
) -> Result<Arc<dyn GarminClient>, AppError> {
    if config.garmin.enabled {
        let client = ConnectClient::new(config.garmin.clone()).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to build Garmin client: {}", e))
        })?;
        tracing::info!(
            api = %config.garmin.connect_api_url,
            auth_bridge = ?config.garmin.auth_bridge_url,
            "Garmin Connect client initialized"
        );
        Ok(Arc::new(client))
    } else {
        tracing::info!("Garmin client disabled, using mock Garmin client");
        Ok(Arc::new(MockGarminClient::new()))
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: GarminServiceConfig) -> Result<Self, AppError> {
        let garmin = garmin_client_from_config(&config)?;
        Self::build_with_client(config, garmin).await
    }

    /// Build the application around an already constructed Garmin client.
    pub async fn build_with_client(
        config: GarminServiceConfig,
        garmin: Arc<dyn GarminClient>,
    ) -> Result<Self, AppError> {
        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            client = garmin.name(),
            "Garmin service: HTTP on port {}",
            port
        );

        Ok(Self {
            port,
            listener,
            state: AppState { config, garmin },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
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
