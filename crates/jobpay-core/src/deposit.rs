//! Client balance top-ups, capped by the client's outstanding unpaid work.
//!
//! The cap read and the balance write run in one serializable transaction,
//! so a deposit can never be approved against an unpaid-work total that a
//! concurrently committing payment has already reduced.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  model::ProfileId,
  money::Amount,
  store::{GuardedUpdate, Isolation, LedgerTx, MarketStore},
};

/// Business rule bounding a single deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositPolicy {
  /// Maximum deposit as a percentage of the client's unpaid job total.
  pub cap_percent: u32,
}

impl Default for DepositPolicy {
  fn default() -> Self { Self { cap_percent: 25 } }
}

impl DepositPolicy {
  /// Whether `amount` fits under the cap for a client owing `unpaid_total`.
  ///
  /// Evaluated in integer arithmetic, so the cap is never rounded up.
  pub fn allows(&self, amount: Amount, unpaid_total: Amount) -> bool {
    i128::from(amount.minor()) * 100
      <= i128::from(unpaid_total.minor()) * i128::from(self.cap_percent)
  }
}

/// The committed outcome of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deposit {
  pub profile_id: ProfileId,
  pub amount:     Amount,
  /// Balance right after the deposit was applied.
  pub balance:    Amount,
}

/// Top up the balance of client `target` by `amount`.
///
/// `amount` must be positive and carry at most two decimal places. Any
/// authenticated `caller` may deposit into any client's account.
pub async fn deposit<S>(
  store: &S,
  policy: DepositPolicy,
  caller: ProfileId,
  target: ProfileId,
  amount: Decimal,
) -> Result<Deposit>
where
  S: MarketStore,
{
  let amount = Amount::from_decimal(amount)?;
  if !amount.is_positive() {
    return Err(Error::InvalidAmount);
  }

  let outcome = store
    .transaction(Isolation::Serializable, move |tx| {
      apply_deposit(tx, policy, target, amount)
    })
    .await;

  match &outcome {
    Ok(d) => tracing::info!(
      caller = %caller,
      target = %d.profile_id,
      amount = %d.amount,
      balance = %d.balance,
      "deposit applied"
    ),
    Err(Error::Conflict) => {
      tracing::warn!(caller = %caller, target = %target, "deposit lost a race")
    }
    Err(e) => tracing::debug!(caller = %caller, target = %target, error = %e, "deposit rejected"),
  }
  outcome
}

/// The deposit workflow, run against an open serializable transaction.
pub fn apply_deposit(
  tx: &mut dyn LedgerTx,
  policy: DepositPolicy,
  target: ProfileId,
  amount: Amount,
) -> Result<Deposit> {
  tx.profile(target)?
    .filter(|p| p.is_client())
    .ok_or(Error::TargetNotEligible(target))?;

  let unpaid_total = tx.unpaid_total(target)?;
  if !policy.allows(amount, unpaid_total) {
    tracing::debug!(%target, %amount, %unpaid_total, "deposit over cap");
    return Err(Error::CapExceeded);
  }

  let update = GuardedUpdate::CreditBalance { profile_id: target, amount };
  if tx.apply(&update)? == 0 {
    return Err(Error::Conflict);
  }

  let balance = tx.profile(target)?.ok_or(Error::Conflict)?.balance;
  Ok(Deposit { profile_id: target, amount, balance })
}
