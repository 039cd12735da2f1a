//! Error type for `jobpay-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A column held a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Whether SQLite refused the operation because another connection holds
  /// a conflicting lock or committed after this transaction's snapshot.
  pub fn is_busy(&self) -> bool {
    let sqlite = match self {
      Error::Sqlite(e) => e,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => e,
      _ => return false,
    };
    matches!(
      sqlite,
      rusqlite::Error::SqliteFailure(f, _)
        if matches!(f.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
  }
}

/// Lost lock races surface as [`jobpay_core::Error::Conflict`]; everything
/// else is an opaque store failure.
impl From<Error> for jobpay_core::Error {
  fn from(e: Error) -> Self {
    if e.is_busy() {
      jobpay_core::Error::Conflict
    } else {
      jobpay_core::Error::store(e)
    }
  }
}
