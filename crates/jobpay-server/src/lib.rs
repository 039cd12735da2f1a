//! Server assembly for jobpay: configuration, seeding and the HTTP app.
//!
//! The binary in `main.rs` is a thin shell over these pieces.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use jobpay_api::{AppState, api_router};
use jobpay_core::{deposit::DepositPolicy, store::MarketStore};
use jobpay_store_sqlite::SeedData;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix of environment variables overriding [`ServerConfig`] fields, e.g.
/// `JOBPAY_PORT=8080`.
pub const ENV_PREFIX: &str = "JOBPAY";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Largest deposit, as a percentage of the client's unpaid job total.
  pub deposit_cap_percent: u32,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_string(),
      port:                3001,
      store_path:          PathBuf::from("database.sqlite3"),
      deposit_cap_percent: DepositPolicy::default().cap_percent,
    }
  }
}

impl ServerConfig {
  /// Load from an optional TOML file at `path`, overlaid with `JOBPAY_*`
  /// environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn deposit_policy(&self) -> DepositPolicy {
    DepositPolicy { cap_percent: self.deposit_cap_percent }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Seeding ──────────────────────────────────────────────────────────────────

/// The data set to seed with: the JSON file at `file`, or the built-in demo
/// marketplace.
pub async fn load_seed(file: Option<&Path>) -> anyhow::Result<SeedData> {
  match file {
    Some(path) => {
      let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {path:?}"))?;
      SeedData::from_json(&json).with_context(|| format!("invalid seed file {path:?}"))
    }
    None => SeedData::demo().context("invalid built-in seed data"),
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full HTTP app: the API routes with request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: MarketStore + 'static,
{
  api_router(state).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use jobpay_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn defaults_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.port, ServerConfig::default().port);
    assert_eq!(cfg.store_path, PathBuf::from("database.sqlite3"));
    assert_eq!(cfg.deposit_policy(), DepositPolicy::default());
  }

  #[test]
  fn file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobpay.toml");
    std::fs::write(&path, "port = 8080\ndeposit_cap_percent = 10\n").unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.deposit_policy().cap_percent, 10);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/db.sqlite3")), PathBuf::from(home).join("db.sqlite3"));
    assert_eq!(expand_tilde(Path::new("/tmp/db.sqlite3")), PathBuf::from("/tmp/db.sqlite3"));
  }

  #[tokio::test]
  async fn seed_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.json");
    std::fs::write(&path, r#"{ "contracts": [], "jobs": [] }"#).unwrap();

    let data = load_seed(Some(path.as_path())).await.unwrap();
    assert!(data.profiles.is_empty());
    let missing = dir.path().join("missing.json");
    assert!(load_seed(Some(missing.as_path())).await.is_err());
    assert_eq!(load_seed(None).await.unwrap().profiles.len(), 8);
  }

  #[tokio::test]
  async fn served_app_pays_a_job() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.seed(load_seed(None).await.unwrap()).await.unwrap();
    let cfg = ServerConfig::default();
    let app = router(AppState::new(Arc::new(store), cfg.deposit_policy()));

    let req = Request::builder()
      .method("POST")
      .uri("/jobs/2/pay")
      .header("profile_id", "1")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["amount"], 201);
  }
}
