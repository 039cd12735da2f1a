//! In-memory [`MarketStore`] used by the orchestrator tests.
//!
//! Each transaction works on a clone of the committed state and swaps it in
//! on success. A concurrent writer can be simulated with
//! [`MemoryStore::interfere`]: the given mutation lands between the
//! transaction's reads and its first guarded update.

use std::{collections::BTreeMap, sync::Mutex};

use crate::{
  Error, Result,
  model::{
    Contract, ContractId, ContractStatus, Job, JobId, PayableJob, Profile, ProfileId,
    ProfileKind,
  },
  money::Amount,
  store::{GuardedUpdate, Isolation, LedgerTx, MarketStore},
};

#[derive(Debug, Clone, Default)]
pub struct State {
  pub profiles:  BTreeMap<ProfileId, Profile>,
  pub contracts: BTreeMap<ContractId, Contract>,
  pub jobs:      BTreeMap<JobId, Job>,
}

#[derive(Default)]
pub struct MemoryStore {
  state:       Mutex<State>,
  interfere:   Mutex<Option<fn(&mut State)>>,
  isolations:  Mutex<Vec<Isolation>>,
}

impl MemoryStore {
  pub fn add_profile(&self, id: i64, kind: ProfileKind, balance: i64) {
    let profile = Profile {
      id:         ProfileId(id),
      first_name: format!("first-{id}"),
      last_name:  format!("last-{id}"),
      profession: "tester".into(),
      kind,
      balance:    Amount::from_minor(balance),
    };
    self.state.lock().unwrap().profiles.insert(profile.id, profile);
  }

  pub fn add_contract(&self, id: i64, client: i64, contractor: i64, status: ContractStatus) {
    let contract = Contract {
      id:            ContractId(id),
      terms:         "terms".into(),
      status,
      client_id:     ProfileId(client),
      contractor_id: ProfileId(contractor),
    };
    self.state.lock().unwrap().contracts.insert(contract.id, contract);
  }

  pub fn add_job(&self, id: i64, contract: i64, price: i64) {
    let job = Job {
      id:           JobId(id),
      contract_id:  ContractId(contract),
      description:  "work".into(),
      price:        Amount::from_minor(price),
      paid:         false,
      payment_date: None,
    };
    self.state.lock().unwrap().jobs.insert(job.id, job);
  }

  pub fn mark_paid(&self, id: i64) {
    let mut state = self.state.lock().unwrap();
    let job = state.jobs.get_mut(&JobId(id)).unwrap();
    job.paid = true;
    job.payment_date = Some(chrono::Utc::now());
  }

  /// Make the next transaction observe `mutation` as a concurrent commit.
  pub fn interfere(&self, mutation: fn(&mut State)) {
    *self.interfere.lock().unwrap() = Some(mutation);
  }

  pub fn snapshot(&self) -> State { self.state.lock().unwrap().clone() }

  pub fn balance(&self, id: i64) -> i64 {
    self.state.lock().unwrap().profiles[&ProfileId(id)].balance.minor()
  }

  pub fn isolations(&self) -> Vec<Isolation> { self.isolations.lock().unwrap().clone() }
}

struct MemoryTx {
  state:      State,
  interfere:  Option<fn(&mut State)>,
  interfered: Option<fn(&mut State)>,
}

fn unpaid_jobs_of(state: &State, client: ProfileId) -> impl Iterator<Item = &Job> {
  state.jobs.values().filter(move |job| {
    !job.paid
      && state
        .contracts
        .get(&job.contract_id)
        .is_some_and(|c| c.client_id == client)
  })
}

impl LedgerTx for MemoryTx {
  fn profile(&mut self, id: ProfileId) -> Result<Option<Profile>> {
    Ok(self.state.profiles.get(&id).cloned())
  }

  fn payable_job(&mut self, job_id: JobId, client_id: ProfileId) -> Result<Option<PayableJob>> {
    let Some(job) = self.state.jobs.get(&job_id).filter(|j| !j.paid) else {
      return Ok(None);
    };
    Ok(
      self
        .state
        .contracts
        .get(&job.contract_id)
        .filter(|c| c.client_id == client_id)
        .map(|c| PayableJob {
          job_id,
          price: job.price,
          client_id: c.client_id,
          contractor_id: c.contractor_id,
        }),
    )
  }

  fn unpaid_total(&mut self, client_id: ProfileId) -> Result<Amount> {
    Ok(unpaid_jobs_of(&self.state, client_id).map(|j| j.price).sum())
  }

  fn apply(&mut self, update: &GuardedUpdate) -> Result<usize> {
    if let Some(mutation) = self.interfere.take() {
      mutation(&mut self.state);
      self.interfered = Some(mutation);
    }
    let changed = match update {
      GuardedUpdate::CreditBalance { profile_id, amount } => {
        match self.state.profiles.get_mut(profile_id) {
          Some(p) => {
            p.balance = p.balance.checked_add(*amount).ok_or(Error::InvalidAmount)?;
            1
          }
          None => 0,
        }
      }
      GuardedUpdate::DebitBalance { profile_id, amount } => {
        match self.state.profiles.get_mut(profile_id) {
          Some(p) if p.balance >= *amount => {
            p.balance = p.balance.checked_sub(*amount).ok_or(Error::InvalidAmount)?;
            1
          }
          _ => 0,
        }
      }
      GuardedUpdate::MarkJobPaid { job_id, paid_at } => {
        match self.state.jobs.get_mut(job_id) {
          Some(j) if !j.paid => {
            j.paid = true;
            j.payment_date = Some(*paid_at);
            1
          }
          _ => 0,
        }
      }
    };
    Ok(changed)
  }
}

impl MarketStore for MemoryStore {
  async fn transaction<T, F>(&self, isolation: Isolation, work: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn LedgerTx) -> Result<T> + Send + 'static,
  {
    self.isolations.lock().unwrap().push(isolation);
    let interfere = self.interfere.lock().unwrap().take();
    let mut committed = self.state.lock().unwrap();
    let mut tx = MemoryTx { state: committed.clone(), interfere, interfered: None };

    let out = work(&mut tx);

    if let Some(mutation) = tx.interfered {
      mutation(&mut committed);
    }
    if out.is_ok() {
      *committed = tx.state;
    }
    out
  }

  async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
    Ok(self.state.lock().unwrap().profiles.get(&id).cloned())
  }

  async fn list_contracts(&self, profile: ProfileId) -> Result<Vec<Contract>> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .contracts
        .values()
        .filter(|c| c.status != ContractStatus::Terminated && c.has_party(profile))
        .cloned()
        .collect(),
    )
  }

  async fn get_contract(&self, id: ContractId, profile: ProfileId) -> Result<Option<Contract>> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .contracts
        .get(&id)
        .filter(|c| c.has_party(profile))
        .cloned(),
    )
  }

  async fn list_unpaid_jobs(&self, profile: ProfileId) -> Result<Vec<Job>> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .jobs
        .values()
        .filter(|j| {
          !j.paid
            && state.contracts.get(&j.contract_id).is_some_and(|c| {
              c.status == ContractStatus::InProgress && c.has_party(profile)
            })
        })
        .cloned()
        .collect(),
    )
  }

  async fn get_client_job(&self, id: JobId, client: ProfileId) -> Result<Option<Job>> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .jobs
        .get(&id)
        .filter(|j| {
          state
            .contracts
            .get(&j.contract_id)
            .is_some_and(|c| c.client_id == client)
        })
        .cloned(),
    )
  }
}
