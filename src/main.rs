use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod embeddings;
mod inference;

use api::AppState;
use config::ServiceConfig;
use inference::{device::parse_device_preference, snapshot::ModelSnapshot, E5Embedder, TextEmbedder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_env()?;
    info!(?cfg, "starting embedding service");

    // -----------------------------
    // Model (loaded once, before we accept traffic)
    // -----------------------------
    let embedder = {
        let cfg = cfg.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<E5Embedder> {
            let device = parse_device_preference(&cfg.device)?;
            let snapshot = ModelSnapshot::resolve(&cfg.model_id, cfg.model_dir.as_deref())?;
            E5Embedder::load(&cfg.model_id, &snapshot, device, cfg.max_seq_len)
        })
        .await
        .context("model loading task panicked")??
    };
    info!(
        model = embedder.model_id(),
        dims = embedder.dimension(),
        "model loaded"
    );

    let state =
        AppState::new(Arc::new(embedder), cfg.max_batch).with_max_body_bytes(cfg.max_body_bytes);
    let app = api::app(state);

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    info!("HTTP listening on http://{}", cfg.bind_addr);
    info!("embed endpoint at http://{}/embed", cfg.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("embedding service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
