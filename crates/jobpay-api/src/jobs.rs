//! Handlers for `/jobs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/jobs/unpaid` | Unpaid jobs on the caller's in-progress contracts |
//! | `POST` | `/jobs/{job_id}/pay` | Caller must be the job's client; returns the settlement |

use axum::{
  Json,
  extract::{Path, State},
};
use jobpay_core::{
  model::{Job, JobId},
  settlement::{self, Settlement},
  store::MarketStore,
};

use crate::{AppState, auth::Caller, error::ApiError};

/// `GET /jobs/unpaid`
pub async fn unpaid<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<Job>>, ApiError>
where
  S: MarketStore + 'static,
{
  Ok(Json(state.store.list_unpaid_jobs(caller.id()).await?))
}

/// `POST /jobs/{job_id}/pay`
pub async fn pay<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(job_id): Path<i64>,
) -> Result<Json<Settlement>, ApiError>
where
  S: MarketStore + 'static,
{
  let job_id = JobId(job_id);

  // Paid jobs pass this check; the settlement itself rejects them.
  state
    .store
    .get_client_job(job_id, caller.id())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;

  Ok(Json(settlement::pay_job(state.store.as_ref(), caller.id(), job_id).await?))
}

#[cfg(test)]
mod tests {
  use axum::http::StatusCode;
  use jobpay_core::{model::ProfileId, store::MarketStore as _};

  use crate::test_support::{json_body, make_state, oneshot_raw};

  #[tokio::test]
  async fn unpaid_jobs_for_party() {
    let state = make_state().await;
    let resp = oneshot_raw(state, "GET", "/jobs/unpaid", Some("7"), "").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|j| j["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![4, 5]);
    assert!(body[0]["paid"].is_null());
  }

  #[tokio::test]
  async fn pay_moves_funds() {
    let state = make_state().await;
    let resp = oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some("1"), "").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["job_id"], 2);
    assert_eq!(body["contractor_id"], 6);
    assert_eq!(body["amount"], 201);

    let client = state.store.get_profile(ProfileId(1)).await.unwrap().unwrap();
    let contractor = state.store.get_profile(ProfileId(6)).await.unwrap().unwrap();
    assert_eq!(client.balance.minor(), 949_00);
    assert_eq!(contractor.balance.minor(), 1415_00);
  }

  #[tokio::test]
  async fn pay_twice_is_not_found() {
    let state = make_state().await;
    let first = oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some("1"), "").await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some("1"), "").await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);

    let client = state.store.get_profile(ProfileId(1)).await.unwrap().unwrap();
    assert_eq!(client.balance.minor(), 949_00);
  }

  #[tokio::test]
  async fn pay_someone_elses_job() {
    let state = make_state().await;
    // Contractor on the contract, and an unrelated client.
    for profile in ["6", "2"] {
      let resp = oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some(profile), "").await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    let resp = oneshot_raw(state, "POST", "/jobs/999/pay", Some("1"), "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn pay_without_funds_fails() {
    let state = make_state().await;
    let resp = oneshot_raw(state.clone(), "POST", "/jobs/5/pay", Some("4"), "").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"], "insufficient funds");

    let client = state.store.get_profile(ProfileId(4)).await.unwrap().unwrap();
    assert_eq!(client.balance.minor(), 1_30);
  }

  #[tokio::test]
  async fn simultaneous_pays_settle_once() {
    let state = make_state().await;
    let (a, b) = tokio::join!(
      oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some("1"), ""),
      oneshot_raw(state.clone(), "POST", "/jobs/2/pay", Some("1"), ""),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);

    let contractor = state.store.get_profile(ProfileId(6)).await.unwrap().unwrap();
    assert_eq!(contractor.balance.minor(), 1415_00);
  }
}
