use garmin_service::config::GarminServiceConfig;
use garmin_service::services::init_metrics;
use garmin_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = GarminServiceConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "garmin-service",
        &config.common.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        garmin_enabled = config.garmin.enabled,
        auth_bridge = config.garmin.auth_bridge_url.is_some(),
        request_timeout_secs = config.garmin.request_timeout_secs,
        "Configuration loaded"
    );

    init_metrics();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    tracing::info!("Starting garmin-service on port {}", app.port());
    app.run_until_stopped().await?;

    Ok(())
}
