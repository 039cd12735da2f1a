//! jobpay server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, optionally seeds it, and serves the JSON API over HTTP.
//!
//! # Demo data
//!
//! To reset the store to the built-in demo marketplace and exit:
//!
//! ```sh
//! cargo run -p jobpay-server -- --seed --seed-only
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use jobpay_api::AppState;
use jobpay_server::{ServerConfig, expand_tilde, load_seed, router};
use jobpay_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "jobpay payment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Replace the store contents before serving: with the JSON data set at
  /// FILE, or with the built-in demo marketplace when FILE is omitted.
  #[arg(long, value_name = "FILE")]
  seed: Option<Option<PathBuf>>,

  /// Exit after seeding instead of serving.
  #[arg(long, requires = "seed")]
  seed_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(file) = &cli.seed {
    let data = load_seed(file.as_deref()).await?;
    store
      .seed(data)
      .await
      .with_context(|| format!("failed to seed store at {store_path:?}"))?;
    if cli.seed_only {
      return Ok(());
    }
  }

  let state = AppState::new(Arc::new(store), server_cfg.deposit_policy());
  let app = router(state);
  let address = server_cfg.address();

  tracing::info!(
    store = %store_path.display(),
    deposit_cap_percent = server_cfg.deposit_cap_percent,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
