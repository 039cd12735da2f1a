//! Handlers for `/contracts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/contracts` | Caller's non-terminated contracts |
//! | `GET`  | `/contracts/{id}` | 404 unless the caller is a party |

use axum::{
  Json,
  extract::{Path, State},
};
use jobpay_core::{
  model::{Contract, ContractId},
  store::MarketStore,
};

use crate::{AppState, auth::Caller, error::ApiError};

/// `GET /contracts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<Contract>>, ApiError>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.store.list_contracts(caller.id()).await?))
}

/// `GET /contracts/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<i64>,
) -> Result<Json<Contract>, ApiError>
where
  S: MarketStore + 'static,
{
  let contract = state
    .store
    .get_contract(ContractId(id), caller.id())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("contract {id} not found")))?;
  Ok(Json(contract))
}
