//! [`SqliteStore`]: the SQLite implementation of [`MarketStore`].

use std::{path::Path, time::Duration};

use jobpay_core::{
  model::{Contract, ContractId, Job, JobId, Profile, ProfileId},
  store::{Isolation, LedgerTx, MarketStore},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result,
  encode::{
    CONTRACT_COLUMNS, JOB_COLUMNS, PROFILE_COLUMNS, RawContract, RawJob, RawProfile,
    encode_contract_status, encode_dt, encode_paid, encode_profile_kind,
  },
  ledger::SqliteLedger,
  schema::SCHEMA,
  seed::SeedData,
};

type CoreResult<T> = jobpay_core::Result<T>;

/// How long a connection waits on another connection's lock before giving up
/// with `SQLITE_BUSY`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A jobpay store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Several
/// stores (or processes) may open the same file; they coordinate only
/// through SQLite's locking and the guarded updates.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Replace the whole data set with `data`, atomically.
  pub async fn seed(&self, data: SeedData) -> Result<()> {
    let (profiles, contracts, jobs) =
      (data.profiles.len(), data.contracts.len(), data.jobs.len());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch("DELETE FROM jobs; DELETE FROM contracts; DELETE FROM profiles;")?;
        for profile in &data.profiles {
          insert_profile(&tx, profile)?;
        }
        for contract in &data.contracts {
          insert_contract(&tx, contract)?;
        }
        for job in &data.jobs {
          insert_job(&tx, job)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(profiles, contracts, jobs, "store seeded");
    Ok(())
  }

  /// Run a read-only query on the connection thread.
  async fn read<T, F>(&self, query: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(self.conn.call(move |conn| Ok(query(conn)?)).await?)
  }
}

fn insert_profile(conn: &rusqlite::Connection, p: &Profile) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO profiles (id, first_name, last_name, profession, kind, balance)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      p.id.0,
      p.first_name,
      p.last_name,
      p.profession,
      encode_profile_kind(p.kind),
      p.balance.minor(),
    ],
  )?;
  Ok(())
}

fn insert_contract(conn: &rusqlite::Connection, c: &Contract) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO contracts (id, terms, status, client_id, contractor_id)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      c.id.0,
      c.terms,
      encode_contract_status(c.status),
      c.client_id.0,
      c.contractor_id.0,
    ],
  )?;
  Ok(())
}

fn insert_job(conn: &rusqlite::Connection, j: &Job) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO jobs (id, contract_id, description, price, paid, payment_date)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      j.id.0,
      j.contract_id.0,
      j.description,
      j.price.minor(),
      encode_paid(j.paid),
      j.payment_date.map(encode_dt),
    ],
  )?;
  Ok(())
}

fn isolation_behavior(isolation: Isolation) -> TransactionBehavior {
  match isolation {
    // SQLite transactions are always serializable; the difference is when
    // the write lock is taken. Deferred takes it at the first write, so
    // guarded updates are what protect the invariants.
    Isolation::ReadCommitted => TransactionBehavior::Deferred,
    // Immediate takes the write lock before the first read, so no other
    // writer can commit between this transaction's reads and writes.
    Isolation::Serializable => TransactionBehavior::Immediate,
  }
}

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  // ── Transactions ──────────────────────────────────────────────────────────

  async fn transaction<T, F>(&self, isolation: Isolation, work: F) -> CoreResult<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn LedgerTx) -> CoreResult<T> + Send + 'static,
  {
    let behavior = isolation_behavior(isolation);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let outcome = work(&mut SqliteLedger::new(&tx));
        // Dropping `tx` without committing rolls it back.
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await
      .map_err(Error::Database)?
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_profile(&self, id: ProfileId) -> CoreResult<Option<Profile>> {
    let raw = self
      .read(move |conn| {
        conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = ?1"),
            rusqlite::params![id.0],
            RawProfile::from_row,
          )
          .optional()
      })
      .await?;

    Ok(raw.map(RawProfile::into_profile).transpose()?)
  }

  async fn list_contracts(&self, profile: ProfileId) -> CoreResult<Vec<Contract>> {
    let raws = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTRACT_COLUMNS}
           FROM contracts c
           WHERE c.status != 'terminated'
             AND (c.client_id = ?1 OR c.contractor_id = ?1)
           ORDER BY c.id"
        ))?;
        stmt
          .query_map(rusqlite::params![profile.0], RawContract::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()
      })
      .await?;

    Ok(raws.into_iter().map(RawContract::into_contract).collect::<Result<_>>()?)
  }

  async fn get_contract(
    &self,
    id: ContractId,
    profile: ProfileId,
  ) -> CoreResult<Option<Contract>> {
    let raw = self
      .read(move |conn| {
        conn
          .query_row(
            &format!(
              "SELECT {CONTRACT_COLUMNS}
               FROM contracts c
               WHERE c.id = ?1
                 AND (c.client_id = ?2 OR c.contractor_id = ?2)"
            ),
            rusqlite::params![id.0, profile.0],
            RawContract::from_row,
          )
          .optional()
      })
      .await?;

    Ok(raw.map(RawContract::into_contract).transpose()?)
  }

  async fn list_unpaid_jobs(&self, profile: ProfileId) -> CoreResult<Vec<Job>> {
    let raws = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {JOB_COLUMNS}
           FROM jobs j
           JOIN contracts c ON c.id = j.contract_id
           WHERE j.paid IS NULL
             AND c.status = 'in_progress'
             AND (c.client_id = ?1 OR c.contractor_id = ?1)
           ORDER BY j.id"
        ))?;
        stmt
          .query_map(rusqlite::params![profile.0], RawJob::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()
      })
      .await?;

    Ok(raws.into_iter().map(RawJob::into_job).collect::<Result<_>>()?)
  }

  async fn get_client_job(&self, id: JobId, client: ProfileId) -> CoreResult<Option<Job>> {
    let raw = self
      .read(move |conn| {
        conn
          .query_row(
            &format!(
              "SELECT {JOB_COLUMNS}
               FROM jobs j
               JOIN contracts c ON c.id = j.contract_id
               WHERE j.id = ?1
                 AND c.client_id = ?2"
            ),
            rusqlite::params![id.0, client.0],
            RawJob::from_row,
          )
          .optional()
      })
      .await?;

    Ok(raw.map(RawJob::into_job).transpose()?)
  }
}
