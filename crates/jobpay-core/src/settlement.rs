//! Job payment: move a job's price from the client to the contractor and
//! latch the job as paid, all in one transaction.
//!
//! Three guarded updates carry the write: credit the contractor, debit the
//! client while the balance still covers the price, and flip `paid` while it
//! is still unset. If any of them changes no row, a concurrent payment or
//! balance change got there first and the whole transaction is rolled back.
//! For a given job, exactly one of any number of concurrent payments can
//! succeed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  model::{JobId, ProfileId},
  money::Amount,
  store::{GuardedUpdate, Isolation, LedgerTx, MarketStore},
};

/// The committed outcome of a job payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
  pub job_id:        JobId,
  pub client_id:     ProfileId,
  pub contractor_id: ProfileId,
  pub amount:        Amount,
  pub paid_at:       DateTime<Utc>,
}

/// Pay job `job_id` on behalf of `caller`, who must be the client on the
/// job's contract.
pub async fn pay_job<S>(store: &S, caller: ProfileId, job_id: JobId) -> Result<Settlement>
where
  S: MarketStore,
{
  let outcome = store
    .transaction(Isolation::ReadCommitted, move |tx| {
      settle(tx, caller, job_id, Utc::now())
    })
    .await;

  match &outcome {
    Ok(s) => tracing::info!(
      job = %s.job_id,
      client = %s.client_id,
      contractor = %s.contractor_id,
      amount = %s.amount,
      "job paid"
    ),
    Err(Error::Conflict) => {
      tracing::warn!(job = %job_id, caller = %caller, "job payment lost a race")
    }
    Err(e) => tracing::debug!(job = %job_id, caller = %caller, error = %e, "job payment rejected"),
  }
  outcome
}

/// The settlement workflow, run against an open transaction.
pub fn settle(
  tx: &mut dyn LedgerTx,
  caller: ProfileId,
  job_id: JobId,
  now: DateTime<Utc>,
) -> Result<Settlement> {
  let job = tx
    .payable_job(job_id, caller)?
    .ok_or(Error::JobNotFoundOrAlreadyPaid(job_id))?;

  let client = tx
    .profile(job.client_id)?
    .ok_or(Error::ProfileNotFound(job.client_id))?;

  if job.price > client.balance {
    return Err(Error::InsufficientFunds);
  }

  let updates = [
    GuardedUpdate::CreditBalance { profile_id: job.contractor_id, amount: job.price },
    GuardedUpdate::DebitBalance { profile_id: job.client_id, amount: job.price },
    GuardedUpdate::MarkJobPaid { job_id, paid_at: now },
  ];

  let mut won = true;
  for update in &updates {
    if tx.apply(update)? == 0 {
      tracing::debug!(?update, "guarded update matched no row");
      won = false;
    }
  }
  if !won {
    return Err(Error::Conflict);
  }

  Ok(Settlement {
    job_id,
    client_id: job.client_id,
    contractor_id: job.contractor_id,
    amount: job.price,
    paid_at: now,
  })
}
