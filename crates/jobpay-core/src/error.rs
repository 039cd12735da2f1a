//! Error types for `jobpay-core`.
//!
//! Every variant aborts the enclosing transaction; nothing is written unless
//! the operation returns `Ok`.

use thiserror::Error;

use crate::model::{JobId, ProfileId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("amount must be a positive number with at most two decimal places")]
  InvalidAmount,

  #[error("profile not found: {0}")]
  ProfileNotFound(ProfileId),

  #[error("job {0} not found or already paid")]
  JobNotFoundOrAlreadyPaid(JobId),

  /// The deposit target does not exist or is not a client. The two cases
  /// share one variant so callers cannot probe for account existence.
  #[error("profile {0} not found")]
  TargetNotEligible(ProfileId),

  #[error("insufficient funds")]
  InsufficientFunds,

  #[error("deposit exceeds the allowed cap")]
  CapExceeded,

  #[error("conflicting concurrent update")]
  Conflict,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification of [`Error`], used to map outcomes onto transport
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  BusinessRule,
  Conflict,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidAmount => ErrorKind::Validation,
      Error::ProfileNotFound(_)
      | Error::JobNotFoundOrAlreadyPaid(_)
      | Error::TargetNotEligible(_) => ErrorKind::NotFound,
      Error::InsufficientFunds | Error::CapExceeded => ErrorKind::BusinessRule,
      Error::Conflict => ErrorKind::Conflict,
      Error::Store(_) => ErrorKind::Internal,
    }
  }

  /// Whether re-running the same request may reach a different outcome.
  pub fn is_retryable(&self) -> bool {
    matches!(self.kind(), ErrorKind::BusinessRule | ErrorKind::Conflict)
  }

  /// Box an arbitrary backend error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
