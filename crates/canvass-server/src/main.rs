//! Canvass server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the contact API over HTTP. `canvass migrate --to <n>`
//! moves the schema to a given version instead.

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use canvass_api::{ApiState, api_router};
use canvass_resolve::OptOutCache;
use canvass_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Canvass contact API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Apply or revert schema migrations.
  Migrate {
    /// Target schema version; defaults to the latest.
    #[arg(long)]
    to: Option<u32>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg).await,
    Command::Migrate { to } => migrate(cfg, to).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  if let Some(parent) = cfg.store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let store = Arc::new(store);
  let opt_outs = Arc::new(OptOutCache::new(
    Arc::clone(&store),
    cfg.opt_out_cache_ttl(),
  ));

  let app = api_router(ApiState { store, opt_outs }).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn migrate(cfg: ServerConfig, to: Option<u32>) -> anyhow::Result<()> {
  let target = to.unwrap_or_else(canvass_store_sqlite::latest_version);

  let store = SqliteStore::connect(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let previous = store
    .migrate_to(target)
    .await
    .with_context(|| format!("failed to migrate to version {target}"))?;

  tracing::info!(from = previous, to = target, "schema migrated");
  Ok(())
}
