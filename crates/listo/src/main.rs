use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use listo::api::{AppState, build_router};
use listo::auth::AuthState;
use listo::config::Settings;
use listo::db::Database;

#[derive(Debug, Parser)]
#[command(name = "listo", version, about = "Collaborative shopping list backend")]
struct Cli {
    /// Path to a config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path.
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(database) = cli.database {
        settings.database.path = database.to_string_lossy().into_owned();
    }

    settings
        .auth
        .validate()
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("auth configuration")?;

    let db_path = settings.database.resolved_path();
    let db = Database::new(&db_path).await?;
    info!("database ready at {}", db_path.display());

    let auth = AuthState::new(settings.auth.clone());
    let state = AppState::new(db, auth);
    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
