//! Authentication and transaction engine.
//!
//! Every operation takes a fresh PIN: authentication is never cached between
//! operations. The account passed in is only updated once the store has
//! accepted the change, so it always mirrors the last persisted row.

use crate::account::Account;
use crate::error::Result;
use crate::lockout::{self, AuthOutcome};
use crate::store::AccountStore;
use chrono::{DateTime, Utc};
use log::debug;

/// A request made from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckBalance,
    Deposit(u64),
    Withdraw(u64),
}

/// What happened to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Authentication failed; nothing beyond the lockout bookkeeping changed.
    Denied(AuthOutcome),

    /// Current balance.
    Balance(u64),

    /// Deposit applied.
    Deposited { balance: u64 },

    /// Withdrawal applied; cash may be dispensed.
    Dispensed { amount: u64, balance: u64 },

    /// Withdrawal refused, balance unchanged.
    InsufficientBalance { balance: u64 },

    /// Amount was zero.
    InvalidAmount,

    /// Deposit refused because the balance would exceed
    /// [`MAX_BALANCE`](crate::account::MAX_BALANCE); balance unchanged.
    AmountTooLarge { balance: u64 },
}

/// The ATM engine, owning its account store for the length of a run.
pub struct Atm<S> {
    store: S,
}

impl<S: AccountStore> Atm<S> {
    pub fn new(store: S) -> Self {
        Atm { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Looks up the account behind a card. `None` means an invalid card.
    pub fn insert_card(&self, card_id: &str) -> Result<Option<Account>> {
        self.store.get(card_id)
    }

    /// Checks a PIN now and persists any lockout bookkeeping.
    pub fn authenticate(&self, account: &mut Account, pin: u32) -> Result<AuthOutcome> {
        self.authenticate_at(account, pin, Utc::now())
    }

    /// Checks a PIN as of `now` and persists any lockout bookkeeping.
    pub fn authenticate_at(
        &self,
        account: &mut Account,
        pin: u32,
        now: DateTime<Utc>,
    ) -> Result<AuthOutcome> {
        let mut working = account.clone();
        let outcome = lockout::authenticate(&mut working, pin, now);

        if outcome.requires_save() {
            self.store.save(&working)?;
            *account = working;
        }

        Ok(outcome)
    }

    /// Authenticates and then runs `op`.
    pub fn execute(&self, account: &mut Account, pin: u32, op: Operation) -> Result<Outcome> {
        self.execute_at(account, pin, op, Utc::now())
    }

    /// Authenticates as of `now` and then runs `op`.
    ///
    /// The authentication result is persisted before the operation runs, so a
    /// storage failure during the operation leaves the lockout state saved and
    /// the balance untouched.
    pub fn execute_at(
        &self,
        account: &mut Account,
        pin: u32,
        op: Operation,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let auth = self.authenticate_at(account, pin, now)?;
        if !auth.is_accepted() {
            return Ok(Outcome::Denied(auth));
        }

        match op {
            Operation::CheckBalance => Ok(Outcome::Balance(account.balance)),
            Operation::Deposit(amount) => self.deposit(account, amount),
            Operation::Withdraw(amount) => self.withdraw(account, amount),
        }
    }

    fn deposit(&self, account: &mut Account, amount: u64) -> Result<Outcome> {
        if amount == 0 {
            return Ok(Outcome::InvalidAmount);
        }

        let mut working = account.clone();
        if !working.deposit(amount) {
            debug!(
                "Card {}: deposit of {} refused (balance limit)",
                account.card_id, amount
            );
            return Ok(Outcome::AmountTooLarge {
                balance: account.balance,
            });
        }

        self.store.save(&working)?;
        *account = working;
        debug!("Card {}: deposited {}", account.card_id, amount);

        Ok(Outcome::Deposited {
            balance: account.balance,
        })
    }

    fn withdraw(&self, account: &mut Account, amount: u64) -> Result<Outcome> {
        if amount == 0 {
            return Ok(Outcome::InvalidAmount);
        }

        let mut working = account.clone();
        if !working.withdraw(amount) {
            debug!(
                "Card {}: withdrawal of {} refused (insufficient balance)",
                account.card_id, amount
            );
            return Ok(Outcome::InsufficientBalance {
                balance: account.balance,
            });
        }

        self.store.save(&working)?;
        *account = working;
        debug!("Card {}: withdrew {}", account.card_id, amount);

        Ok(Outcome::Dispensed {
            amount,
            balance: account.balance,
        })
    }
}
