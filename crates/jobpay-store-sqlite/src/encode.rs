//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Amounts are stored as integer minor units, timestamps as RFC 3339
//! strings, enums as lowercase text. `jobs.paid` is NULL or 1.

use chrono::{DateTime, Utc};
use jobpay_core::{
  model::{
    Contract, ContractId, ContractStatus, Job, JobId, PayableJob, Profile, ProfileId,
    ProfileKind,
  },
  money::Amount,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── ProfileKind ─────────────────────────────────────────────────────────────

pub fn encode_profile_kind(k: ProfileKind) -> &'static str {
  match k {
    ProfileKind::Client => "client",
    ProfileKind::Contractor => "contractor",
  }
}

pub fn decode_profile_kind(s: &str) -> Result<ProfileKind> {
  match s {
    "client" => Ok(ProfileKind::Client),
    "contractor" => Ok(ProfileKind::Contractor),
    other => Err(Error::Decode(format!("unknown profile kind: {other:?}"))),
  }
}

// ─── ContractStatus ──────────────────────────────────────────────────────────

pub fn encode_contract_status(s: ContractStatus) -> &'static str {
  match s {
    ContractStatus::New => "new",
    ContractStatus::InProgress => "in_progress",
    ContractStatus::Terminated => "terminated",
  }
}

pub fn decode_contract_status(s: &str) -> Result<ContractStatus> {
  match s {
    "new" => Ok(ContractStatus::New),
    "in_progress" => Ok(ContractStatus::InProgress),
    "terminated" => Ok(ContractStatus::Terminated),
    other => Err(Error::Decode(format!("unknown contract status: {other:?}"))),
  }
}

// ─── Paid latch ──────────────────────────────────────────────────────────────

pub fn encode_paid(paid: bool) -> Option<i64> { paid.then_some(1) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str =
  "p.id, p.first_name, p.last_name, p.profession, p.kind, p.balance";

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub id:         i64,
  pub first_name: String,
  pub last_name:  String,
  pub profession: String,
  pub kind:       String,
  pub balance:    i64,
}

impl RawProfile {
  /// Map a row selected with [`PROFILE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawProfile {
      id:         row.get(0)?,
      first_name: row.get(1)?,
      last_name:  row.get(2)?,
      profession: row.get(3)?,
      kind:       row.get(4)?,
      balance:    row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      id:         ProfileId(self.id),
      first_name: self.first_name,
      last_name:  self.last_name,
      profession: self.profession,
      kind:       decode_profile_kind(&self.kind)?,
      balance:    Amount::from_minor(self.balance),
    })
  }
}

pub const CONTRACT_COLUMNS: &str =
  "c.id, c.terms, c.status, c.client_id, c.contractor_id";

/// Raw values read directly from a `contracts` row.
pub struct RawContract {
  pub id:            i64,
  pub terms:         String,
  pub status:        String,
  pub client_id:     i64,
  pub contractor_id: i64,
}

impl RawContract {
  /// Map a row selected with [`CONTRACT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawContract {
      id:            row.get(0)?,
      terms:         row.get(1)?,
      status:        row.get(2)?,
      client_id:     row.get(3)?,
      contractor_id: row.get(4)?,
    })
  }

  pub fn into_contract(self) -> Result<Contract> {
    Ok(Contract {
      id:            ContractId(self.id),
      terms:         self.terms,
      status:        decode_contract_status(&self.status)?,
      client_id:     ProfileId(self.client_id),
      contractor_id: ProfileId(self.contractor_id),
    })
  }
}

pub const JOB_COLUMNS: &str =
  "j.id, j.contract_id, j.description, j.price, j.paid, j.payment_date";

/// Raw values read directly from a `jobs` row.
pub struct RawJob {
  pub id:           i64,
  pub contract_id:  i64,
  pub description:  String,
  pub price:        i64,
  pub paid:         Option<i64>,
  pub payment_date: Option<String>,
}

impl RawJob {
  /// Map a row selected with [`JOB_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawJob {
      id:           row.get(0)?,
      contract_id:  row.get(1)?,
      description:  row.get(2)?,
      price:        row.get(3)?,
      paid:         row.get(4)?,
      payment_date: row.get(5)?,
    })
  }

  pub fn into_job(self) -> Result<Job> {
    Ok(Job {
      id:           JobId(self.id),
      contract_id:  ContractId(self.contract_id),
      description:  self.description,
      price:        Amount::from_minor(self.price),
      paid:         self.paid.is_some(),
      payment_date: self.payment_date.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// An unpaid job joined with the parties of its contract.
pub fn payable_job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PayableJob> {
  Ok(PayableJob {
    job_id:        JobId(row.get(0)?),
    price:         Amount::from_minor(row.get(1)?),
    client_id:     ProfileId(row.get(2)?),
    contractor_id: ProfileId(row.get(3)?),
  })
}
