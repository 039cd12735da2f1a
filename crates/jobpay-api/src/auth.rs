//! Caller identity extractor.
//!
//! Requests name their caller with a `profile_id` header. The header is
//! trusted as-is; it only has to resolve to an existing profile.

use axum::{extract::FromRequestParts, http::request::Parts};
use jobpay_core::{
  model::{Profile, ProfileId},
  store::MarketStore,
};

use crate::{AppState, error::ApiError};

pub const PROFILE_HEADER: &str = "profile_id";

/// The resolved profile of the caller making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub Profile);

impl Caller {
  pub fn id(&self) -> ProfileId { self.0.id }
}

/// Parse the raw header value into a profile id.
pub fn parse_profile_id(parts: &Parts) -> Result<ProfileId, ApiError> {
  parts
    .headers
    .get(PROFILE_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.trim().parse::<i64>().ok())
    .map(ProfileId)
    .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<AppState<S>> for Caller
where
  S: MarketStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let id = parse_profile_id(parts)?;
    let profile = state
      .store
      .get_profile(id)
      .await?
      .ok_or(ApiError::Unauthorized)?;
    Ok(Caller(profile))
  }
}
