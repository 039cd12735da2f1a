//! Handler for `POST /balances/deposit/{profile_id}`.
//!
//! The body is read raw so that a missing, empty or non-numeric `amount`
//! is reported as an invalid amount (400) before the target is looked up.

use std::str::FromStr;

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
};
use jobpay_core::{
  Error,
  deposit::{self, Deposit},
  model::ProfileId,
  store::MarketStore,
};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{AppState, auth::Caller, error::ApiError};

/// Pull `amount` out of a `{"amount": <number>}` body.
///
/// Only JSON numbers are accepted; strings, nulls and absent fields are
/// all [`Error::InvalidAmount`].
pub fn parse_amount(body: &[u8]) -> Result<Decimal, Error> {
  let value: Value = serde_json::from_slice(body).map_err(|_| Error::InvalidAmount)?;
  let Some(Value::Number(n)) = value.get("amount") else {
    return Err(Error::InvalidAmount);
  };
  let text = n.to_string();
  Decimal::from_str(&text)
    .or_else(|_| Decimal::from_scientific(&text))
    .map_err(|_| Error::InvalidAmount)
}

/// `POST /balances/deposit/{profile_id}`
pub async fn deposit<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(target): Path<i64>,
  body: Bytes,
) -> Result<Json<Deposit>, ApiError>
where
  S: MarketStore + 'static,
{
  let amount = parse_amount(&body)?;
  let outcome = deposit::deposit(
    state.store.as_ref(),
    state.policy,
    caller.id(),
    ProfileId(target),
    amount,
  )
  .await?;
  Ok(Json(outcome))
}
