//! Provisioning data sets.
//!
//! Profiles, contracts and jobs are created outside the payment workflows.
//! A [`SeedData`] bundles all three so a store can be (re)populated in one
//! transaction, either from the built-in demo marketplace or from a JSON
//! file of the same shape.

use jobpay_core::model::{Contract, Job, Profile};
use serde::Deserialize;

use crate::Result;

/// The built-in demo marketplace.
pub const DEMO_SEED: &str = include_str!("seed.json");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
  #[serde(default)]
  pub profiles:  Vec<Profile>,
  #[serde(default)]
  pub contracts: Vec<Contract>,
  #[serde(default)]
  pub jobs:      Vec<Job>,
}

impl SeedData {
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }

  pub fn demo() -> Result<Self> { Self::from_json(DEMO_SEED) }
}
