use clap::Parser;
use jsondir_server::config::Config;
use jsondir_server::{app, AppState};
use jsondir_storage::Collections;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    if !config.base_dir.is_dir() {
        anyhow::bail!("base directory {} does not exist", config.base_dir.display());
    }
    let state = AppState::new(Collections::new(config.collection_options()));
    let found = state.collections.discover();
    info!(
        base_dir = %config.base_dir.display(),
        collections = found.len(),
        max_items = config.max_items,
        "serving collections"
    );

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("http listening on {}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
