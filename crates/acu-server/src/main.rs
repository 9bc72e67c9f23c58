use std::path::PathBuf;

use acu_server::{AppState, create_router, load_config};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// AcuVerify school administration server.
#[derive(Debug, Parser)]
#[command(name = "acu-server", version, about)]
struct Cli {
    /// Settings file (TOML).
    #[arg(short, long, env = "ACU_SERVER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address; overrides `[server].bind`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        cfg.server.bind = bind;
    }

    let state = AppState::init(&cfg).await?;
    let app = create_router(state);

    let listener = TcpListener::bind(&cfg.server.bind).await?;
    tracing::info!(address = %cfg.server.bind, database = %cfg.database.sqlite_path, "acu-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("acu-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
