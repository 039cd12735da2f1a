//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use jobpay_core::{Error, ErrorKind};
use serde_json::json;

/// An error returned by an API handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// No `profile_id` header, or it names no known profile.
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Core(#[from] Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Core(e) => match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        // An oversized deposit is the caller's to fix; a payment that could
        // not be funded is an operation failure.
        ErrorKind::BusinessRule if matches!(e, Error::CapExceeded) => StatusCode::BAD_REQUEST,
        ErrorKind::BusinessRule | ErrorKind::Conflict | ErrorKind::Internal => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if let ApiError::Core(e @ Error::Store(_)) = &self {
      tracing::error!(error = %e, "store failure");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use jobpay_core::model::{JobId, ProfileId};

  use super::*;

  #[test]
  fn core_errors_map_to_status() {
    let cases = [
      (Error::InvalidAmount, StatusCode::BAD_REQUEST),
      (Error::CapExceeded, StatusCode::BAD_REQUEST),
      (Error::TargetNotEligible(ProfileId(9)), StatusCode::NOT_FOUND),
      (Error::JobNotFoundOrAlreadyPaid(JobId(1)), StatusCode::NOT_FOUND),
      (Error::ProfileNotFound(ProfileId(1)), StatusCode::NOT_FOUND),
      (Error::InsufficientFunds, StatusCode::INTERNAL_SERVER_ERROR),
      (Error::Conflict, StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[tokio::test]
  async fn body_carries_message() {
    let resp = ApiError::from(Error::InsufficientFunds).into_response();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "insufficient funds");
  }
}
