//! The `MarketStore` trait, the transactional `LedgerTx` handle and the
//! guarded-update primitive both orchestrators are built on.
//!
//! The trait is implemented by storage backends (e.g. `jobpay-store-sqlite`).
//! Higher layers (`jobpay-api`, `jobpay-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Result,
  model::{Contract, ContractId, Job, JobId, PayableJob, Profile, ProfileId},
  money::Amount,
};

// ─── Isolation ───────────────────────────────────────────────────────────────

/// Isolation requested when a transaction is acquired.
///
/// Requested per call rather than configured globally, so settlement and
/// deposit can ask for different guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
  /// Reads see committed data; writes are protected by their own guards.
  ReadCommitted,
  /// The transaction behaves as if it ran alone.
  Serializable,
}

// ─── Guarded update ──────────────────────────────────────────────────────────

/// A single-row write that only takes effect while its predicate still holds.
///
/// Applying one reports the number of rows changed: `1` when this write won,
/// `0` when the predicate no longer matched because another actor moved the
/// row first. A `1` is the linearisation point of the caller's operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedUpdate {
  /// `balance = balance + amount WHERE id = profile_id`
  CreditBalance { profile_id: ProfileId, amount: Amount },
  /// `balance = balance - amount WHERE id = profile_id AND balance >= amount`
  DebitBalance { profile_id: ProfileId, amount: Amount },
  /// `paid = true, payment_date = paid_at WHERE id = job_id AND paid IS NULL`
  MarkJobPaid { job_id: JobId, paid_at: DateTime<Utc> },
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// Operations available inside one store transaction.
///
/// Every call observes the transaction's own writes. Nothing done through
/// this handle becomes visible to others unless the enclosing
/// [`MarketStore::transaction`] work returns `Ok`.
pub trait LedgerTx {
  /// Load a profile by id.
  fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>>;

  /// Load job `job_id` joined with its contract, provided it is still unpaid
  /// and `client_id` is the client on that contract.
  fn payable_job(
    &mut self,
    job_id: JobId,
    client_id: ProfileId,
  ) -> Result<Option<PayableJob>>;

  /// Sum of prices over every unpaid job on contracts where `client_id` is
  /// the client. Zero when there are none.
  fn unpaid_total(&mut self, client_id: ProfileId) -> Result<Amount>;

  /// Apply a guarded update and return the number of rows it changed.
  fn apply(&mut self, update: &GuardedUpdate) -> Result<usize>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a marketplace store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MarketStore: Send + Sync {
  // ── Transactions ──────────────────────────────────────────────────────

  /// Run `work` inside one transaction at the requested isolation.
  ///
  /// Commits only when `work` returns `Ok`; any `Err` (or a panic) rolls the
  /// transaction back. A transaction that loses a serialisation or lock race
  /// fails with [`Error::Conflict`](crate::Error::Conflict).
  fn transaction<T, F>(
    &self,
    isolation: Isolation,
    work: F,
  ) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a profile by id. Returns `None` if not found.
  fn get_profile(
    &self,
    id: ProfileId,
  ) -> impl Future<Output = Result<Option<Profile>>> + Send + '_;

  /// Non-terminated contracts on which `profile` is client or contractor.
  fn list_contracts(
    &self,
    profile: ProfileId,
  ) -> impl Future<Output = Result<Vec<Contract>>> + Send + '_;

  /// Contract `id`, only if `profile` is one of its parties.
  fn get_contract(
    &self,
    id: ContractId,
    profile: ProfileId,
  ) -> impl Future<Output = Result<Option<Contract>>> + Send + '_;

  /// Unpaid jobs on `in_progress` contracts where `profile` is a party.
  fn list_unpaid_jobs(
    &self,
    profile: ProfileId,
  ) -> impl Future<Output = Result<Vec<Job>>> + Send + '_;

  /// Job `id` in any paid state, only if `client` is the client on its
  /// contract.
  fn get_client_job(
    &self,
    id: JobId,
    client: ProfileId,
  ) -> impl Future<Output = Result<Option<Job>>> + Send + '_;
}
