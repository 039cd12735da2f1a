//! JSON REST API for jobpay.
//!
//! Exposes an axum [`Router`] backed by any [`jobpay_core::store::MarketStore`].
//! Every route resolves the caller from the `profile_id` header; TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = jobpay_api::api_router(AppState::new(store, policy));
//! ```

pub mod auth;
pub mod balances;
pub mod contracts;
pub mod error;
pub mod jobs;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use jobpay_core::{deposit::DepositPolicy, store::MarketStore};

pub use auth::Caller;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub policy: DepositPolicy,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, policy: DepositPolicy) -> Self { Self { store, policy } }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), policy: self.policy }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: MarketStore + 'static,
{
  Router::new()
    // Contracts
    .route("/contracts", get(contracts::list::<S>))
    .route("/contracts/{id}", get(contracts::get_one::<S>))
    // Jobs
    .route("/jobs/unpaid", get(jobs::unpaid::<S>))
    .route("/jobs/{job_id}/pay", post(jobs::pay::<S>))
    // Balances
    .route("/balances/deposit/{profile_id}", post(balances::deposit::<S>))
    .with_state(state)
}
