//! [`SqliteLedger`]: the [`LedgerTx`] handle over an open SQLite
//! transaction.
//!
//! Each [`GuardedUpdate`] becomes exactly one `UPDATE ... WHERE ...`
//! statement whose predicate carries the guard, and the statement's change
//! count is reported back unchanged.

use jobpay_core::{
  model::{JobId, PayableJob, Profile, ProfileId},
  money::Amount,
  store::{GuardedUpdate, LedgerTx},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error,
  encode::{PROFILE_COLUMNS, RawProfile, encode_dt, payable_job_from_row},
};

type CoreResult<T> = jobpay_core::Result<T>;

pub struct SqliteLedger<'a> {
  conn: &'a Connection,
}

impl<'a> SqliteLedger<'a> {
  /// Wrap a connection that already has a transaction open on it.
  pub fn new(conn: &'a Connection) -> Self { Self { conn } }
}

/// Run a guarded update on `conn` and return the number of rows changed.
pub fn apply_update(conn: &Connection, update: &GuardedUpdate) -> rusqlite::Result<usize> {
  match update {
    GuardedUpdate::CreditBalance { profile_id, amount } => conn.execute(
      "UPDATE profiles SET balance = balance + ?2 WHERE id = ?1",
      rusqlite::params![profile_id.0, amount.minor()],
    ),
    GuardedUpdate::DebitBalance { profile_id, amount } => conn.execute(
      "UPDATE profiles SET balance = balance - ?2 WHERE id = ?1 AND balance >= ?2",
      rusqlite::params![profile_id.0, amount.minor()],
    ),
    GuardedUpdate::MarkJobPaid { job_id, paid_at } => conn.execute(
      "UPDATE jobs SET paid = 1, payment_date = ?2 WHERE id = ?1 AND paid IS NULL",
      rusqlite::params![job_id.0, encode_dt(*paid_at)],
    ),
  }
}

impl LedgerTx for SqliteLedger<'_> {
  fn profile(&mut self, id: ProfileId) -> CoreResult<Option<Profile>> {
    let raw = self
      .conn
      .query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.id = ?1"),
        rusqlite::params![id.0],
        RawProfile::from_row,
      )
      .optional()
      .map_err(Error::Sqlite)?;
    Ok(raw.map(RawProfile::into_profile).transpose()?)
  }

  fn payable_job(
    &mut self,
    job_id: JobId,
    client_id: ProfileId,
  ) -> CoreResult<Option<PayableJob>> {
    Ok(
      self
        .conn
        .query_row(
          "SELECT j.id, j.price, c.client_id, c.contractor_id
           FROM jobs j
           JOIN contracts c ON c.id = j.contract_id
           WHERE j.id = ?1
             AND j.paid IS NULL
             AND c.client_id = ?2",
          rusqlite::params![job_id.0, client_id.0],
          payable_job_from_row,
        )
        .optional()
        .map_err(Error::Sqlite)?,
    )
  }

  fn unpaid_total(&mut self, client_id: ProfileId) -> CoreResult<Amount> {
    let total: i64 = self
      .conn
      .query_row(
        "SELECT COALESCE(SUM(j.price), 0)
         FROM jobs j
         JOIN contracts c ON c.id = j.contract_id
         WHERE c.client_id = ?1
           AND j.paid IS NULL",
        rusqlite::params![client_id.0],
        |row| row.get(0),
      )
      .map_err(Error::Sqlite)?;
    Ok(Amount::from_minor(total))
  }

  fn apply(&mut self, update: &GuardedUpdate) -> CoreResult<usize> {
    Ok(apply_update(self.conn, update).map_err(Error::Sqlite)?)
  }
}
