//! Profiles, contracts and jobs.
//!
//! Profiles are monetary accounts. A contract binds one client profile to one
//! contractor profile, and jobs are the billable units of work under a
//! contract. A job's `paid` flag is a one-way latch: once set, its price,
//! flag and payment date never change again.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Amount;

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
    }
  };
}

id_type!(
  /// Identifier of a [`Profile`].
  ProfileId
);
id_type!(
  /// Identifier of a [`Contract`].
  ContractId
);
id_type!(
  /// Identifier of a [`Job`].
  JobId
);

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Which side of a contract a profile can stand on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
  Client,
  Contractor,
}

/// A monetary account. `balance` is never negative in any committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:         ProfileId,
  pub first_name: String,
  pub last_name:  String,
  pub profession: String,
  #[serde(rename = "type")]
  pub kind:       ProfileKind,
  pub balance:    Amount,
}

impl Profile {
  pub fn is_client(&self) -> bool { self.kind == ProfileKind::Client }
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// Lifecycle of a contract. Transitions happen outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
  New,
  InProgress,
  Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
  pub id:            ContractId,
  pub terms:         String,
  pub status:        ContractStatus,
  pub client_id:     ProfileId,
  pub contractor_id: ProfileId,
}

impl Contract {
  /// Whether `profile` is the client or the contractor on this contract.
  pub fn has_party(&self, profile: ProfileId) -> bool {
    self.client_id == profile || self.contractor_id == profile
  }
}

// ─── Job ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
  pub id:           JobId,
  pub contract_id:  ContractId,
  pub description:  String,
  pub price:        Amount,
  /// `false` means "not yet paid"; stored and exchanged as null.
  #[serde(default, with = "paid_latch")]
  pub paid:         bool,
  /// Set exactly when `paid` becomes `true`.
  #[serde(default)]
  pub payment_date: Option<DateTime<Utc>>,
}

/// The paid flag on the wire: `true` when paid, `null` otherwise.
mod paid_latch {
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(paid: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    if *paid { serializer.serialize_bool(true) } else { serializer.serialize_none() }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
  }
}

/// An unpaid job together with the parties of its owning contract. The
/// settlement workflow starts from this row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayableJob {
  pub job_id:        JobId,
  pub price:         Amount,
  pub client_id:     ProfileId,
  pub contractor_id: ProfileId,
}
