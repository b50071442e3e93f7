use anyhow::Context;
use user_registry::lifecycle::shutdown_signal;
use user_registry::{AppConfig, ConfigService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = ConfigService::new();
    let config = AppConfig::from_service(&settings)?;

    let (filter, filter_error) = config.env_filter();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = filter_error {
        tracing::warn!(
            filter = %config.log_filter,
            error = %e,
            "invalid RUST_LOG directive, falling back to info"
        );
    }

    let app = user_registry::bootstrap(&config).await?;

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(%address, prefix = %config.api_prefix, "user registry listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}
