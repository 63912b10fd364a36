//! # ATM Terminal
//!
//! A single-user ATM simulator over a persistent SQLite account store. It
//! authenticates a card and PIN, locks the card for 24 hours after three
//! consecutive wrong PINs, and lets the holder check balance, deposit and
//! withdraw.
//!
//! ## Design Principles
//!
//! - **Explicit lock state**: `LockState::{Unlocked, Locked { until }}` with
//!   a pure transition function, testable without storage
//! - **Injected store**: the engine owns an [`AccountStore`] handle instead of
//!   reaching for global connection settings
//! - **Scoped connections**: each store call opens and releases its own
//!   connection
//! - **Strict invariants**: `balance >= 0` and `failed_attempts <= 3` always
//!
//! ## Example
//!
//! ```no_run
//! use atm_terminal::{Atm, Operation, Outcome, SqliteStore};
//!
//! let store = SqliteStore::open("atm.db").unwrap();
//! store.seed_demo_accounts().unwrap();
//!
//! let atm = Atm::new(store);
//! let mut account = atm.insert_card("4444-5555-6666").unwrap().unwrap();
//! let outcome = atm.execute(&mut account, 4321, Operation::Withdraw(3000)).unwrap();
//! assert_eq!(outcome, Outcome::Dispensed { amount: 3000, balance: 5000 });
//! ```

pub mod account;
pub mod atm;
pub mod error;
pub mod lockout;
pub mod store;
pub mod terminal;

pub use account::Account;
pub use atm::{Atm, Operation, Outcome};
pub use error::{AtmError, Result};
pub use lockout::{AuthOutcome, LockState};
pub use store::{AccountStore, SqliteStore};
pub use terminal::Terminal;
