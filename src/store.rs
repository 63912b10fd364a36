//! SQLite persistence for accounts.
//!
//! Only this module talks to the database. Each [`AccountStore::get`] and
//! [`AccountStore::save`] acquires its own connection, which is released when
//! it drops at the end of the call, on success and error paths alike.

use crate::account::Account;
use crate::error::{AtmError, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "atm.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        card_number TEXT PRIMARY KEY,
        pin INTEGER NOT NULL,
        balance INTEGER NOT NULL,
        wrong_attempts INTEGER NOT NULL,
        locked_until TEXT
    )
";

/// Demo accounts written on first run: card, PIN, balance.
pub const DEMO_ACCOUNTS: [(&str, u32, u64); 2] = [
    ("1111-2222-3333", 1234, 5000),
    ("4444-5555-6666", 4321, 8000),
];

/// Point lookup and upsert of accounts by card id.
pub trait AccountStore {
    /// Looks up an account. A miss is `Ok(None)`, not an error.
    fn get(&self, card_id: &str) -> Result<Option<Account>>;

    /// Inserts or fully replaces the row keyed by `account.card_id`.
    fn save(&self, account: &Account) -> Result<()>;
}

/// Account store backed by a single SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

/// Column values exactly as read from a row, before validation.
type RawRow = (String, i64, i64, i64, Option<String>);

impl SqliteStore {
    /// Opens the store at `path`, creating the file and table if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?.execute_batch(SCHEMA)?;
        debug!("Opened account store at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the demo accounts unless the first one already exists.
    ///
    /// Returns `true` if the accounts were written.
    pub fn seed_demo_accounts(&self) -> Result<bool> {
        let (first_card, _, _) = DEMO_ACCOUNTS[0];
        if self.get(first_card)?.is_some() {
            return Ok(false);
        }

        for (card_id, pin, balance) in DEMO_ACCOUNTS {
            self.save(&Account::new(card_id, pin, balance))?;
        }
        info!("Seeded {} demo accounts", DEMO_ACCOUNTS.len());
        Ok(true)
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }
}

impl AccountStore for SqliteStore {
    fn get(&self, card_id: &str) -> Result<Option<Account>> {
        let conn = self.connect()?;
        let row: Option<RawRow> = conn
            .query_row(
                "SELECT card_number, pin, balance, wrong_attempts, locked_until
                 FROM accounts WHERE card_number = ?1",
                params![card_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        debug!("Lookup card {}: {}", card_id, if row.is_some() { "found" } else { "missing" });
        row.map(account_from_row).transpose()
    }

    fn save(&self, account: &Account) -> Result<()> {
        let conn = self.connect()?;
        let balance = i64::try_from(account.balance).map_err(|_| AtmError::CorruptRecord {
            card_id: account.card_id.clone(),
            message: format!("balance {} exceeds storage range", account.balance),
        })?;
        let locked_until = account.lock_until.map(|t| t.to_rfc3339());

        conn.execute(
            "INSERT OR REPLACE INTO accounts
             (card_number, pin, balance, wrong_attempts, locked_until)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.card_id,
                account.pin,
                balance,
                account.failed_attempts,
                locked_until
            ],
        )?;

        debug!(
            "Saved card {}: balance={} attempts={} locked_until={:?}",
            account.card_id, account.balance, account.failed_attempts, account.lock_until
        );
        Ok(())
    }
}

/// Validates raw column values into an [`Account`].
fn account_from_row(row: RawRow) -> Result<Account> {
    let (card_id, pin, balance, attempts, locked_until) = row;
    let corrupt = |message: String| AtmError::CorruptRecord {
        card_id: card_id.clone(),
        message,
    };

    let pin = u32::try_from(pin).map_err(|_| corrupt(format!("invalid pin value {}", pin)))?;
    let balance =
        u64::try_from(balance).map_err(|_| corrupt(format!("negative balance {}", balance)))?;
    let failed_attempts = u8::try_from(attempts)
        .ok()
        .filter(|n| *n <= crate::lockout::MAX_FAILED_ATTEMPTS)
        .ok_or_else(|| corrupt(format!("attempt counter {} out of range", attempts)))?;
    let lock_until = locked_until
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("bad lock timestamp {:?}: {}", s, e)))
        })
        .transpose()?;

    Ok(Account {
        card_id,
        pin,
        balance,
        failed_attempts,
        lock_until,
    })
}
