use anyhow::Context;
use backend::config::load_config;
use backend::{app, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    if !config.bind_addr.ip().is_loopback() {
        warn!(addr = %config.bind_addr, "binding beyond loopback; the renderer bridge has no auth");
    }
    match &config.name_cache_path {
        Some(path) => info!(path = %path.display(), "player names cached on disk"),
        None => info!("player names kept in memory only"),
    }

    let state = AppState::start(&config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "impostor session controller listening");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
