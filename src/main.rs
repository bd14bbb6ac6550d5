//! listnd: Binary Entrypoint
//! Boots the Axum HTTP server for the listening-history dashboard.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use listnd::ingest::config::load_config_default;
use listnd::metrics::Metrics;

const DEFAULT_ADDR: &str = "127.0.0.1:8050";

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| v == "1")
}

/// Compact logs by default; `LISTND_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("listnd=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if env_flag("LISTND_LOG_JSON") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = load_config_default().context("loading pipeline config")?;
    tracing::info!(target: "config", years = ?config.years, "pipeline config ready");

    let mut app = listnd::create_router(config);
    if env_flag("LISTND_METRICS") {
        let metrics = Metrics::init()?;
        app = app.merge(metrics.router());
        tracing::info!(target: "api", "/metrics enabled");
    }

    let addr = std::env::var("LISTND_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(target: "api", %addr, "listening");

    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
