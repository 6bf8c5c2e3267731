use scim_bridge::{app, config::AppConfig, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PROXY_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Starting SCIM bridge in {:?} mode, forwarding to {}",
        config.environment,
        config.proxy.url
    );

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("SCIM bridge listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
