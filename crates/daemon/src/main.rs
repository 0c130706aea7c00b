#![forbid(unsafe_code)]

//! Phone verification demo daemon.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use phoneauth_daemon::{
    config::{api_key_from_env, DaemonConfig},
    http,
    service::{DemoService, DemoSettings},
    textgen::{GeminiBackend, TextService},
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "phoneauth-daemon", version, about = "Phone verification demo server")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DaemonConfig::load(args.config.as_deref())?;
    let api_key = api_key_from_env()?;
    let backend = GeminiBackend::new(&config.gemini, api_key).context("create gemini backend")?;
    tracing::info!(model = %config.gemini.model, "text backend ready");

    let svc = DemoService::new(
        DemoSettings::from_config(&config),
        TextService::new(Arc::new(backend)),
    );
    svc.start().context("mount verification widget")?;

    let app = http::router(Arc::clone(&svc));

    tracing::info!(listen = %args.listen, "daemon starting");
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    svc.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown requested");
}
