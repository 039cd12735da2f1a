//! SQL schema for the jobpay SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Balances are minor units (cents).
CREATE TABLE IF NOT EXISTS profiles (
    id          INTEGER PRIMARY KEY,
    first_name  TEXT    NOT NULL,
    last_name   TEXT    NOT NULL,
    profession  TEXT    NOT NULL,
    kind        TEXT    NOT NULL CHECK (kind IN ('client', 'contractor')),
    balance     INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0)
);

CREATE TABLE IF NOT EXISTS contracts (
    id             INTEGER PRIMARY KEY,
    terms          TEXT    NOT NULL,
    status         TEXT    NOT NULL CHECK (status IN ('new', 'in_progress', 'terminated')),
    client_id      INTEGER NOT NULL REFERENCES profiles(id),
    contractor_id  INTEGER NOT NULL REFERENCES profiles(id)
);

-- paid is NULL (unpaid) or 1; false is never stored.
CREATE TABLE IF NOT EXISTS jobs (
    id            INTEGER PRIMARY KEY,
    contract_id   INTEGER NOT NULL REFERENCES contracts(id),
    description   TEXT    NOT NULL,
    price         INTEGER NOT NULL CHECK (price > 0),
    paid          INTEGER CHECK (paid IS NULL OR paid = 1),
    payment_date  TEXT,   -- ISO 8601 UTC
    CHECK ((paid IS NULL) = (payment_date IS NULL))
);

-- A paid job is frozen.
CREATE TRIGGER IF NOT EXISTS jobs_paid_latch
BEFORE UPDATE ON jobs
WHEN OLD.paid IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'job is already paid');
END;

CREATE INDEX IF NOT EXISTS contracts_client_idx     ON contracts(client_id);
CREATE INDEX IF NOT EXISTS contracts_contractor_idx ON contracts(contractor_id);
CREATE INDEX IF NOT EXISTS jobs_contract_idx        ON jobs(contract_id);

PRAGMA user_version = 1;
";
