//! Account record and balance operations.
//!
//! Maintains the invariant: `balance >= 0` at all times, enforced by the
//! unsigned balance type and by refusing withdrawals that exceed it.

use crate::lockout::LockState;
use chrono::{DateTime, Utc};

/// Largest balance the account store can hold.
pub const MAX_BALANCE: u64 = i64::MAX as u64;

/// One persisted account, keyed by card id.
///
/// # Invariants
///
/// - `balance` never goes negative and never exceeds [`MAX_BALANCE`]
/// - `failed_attempts` stays within `0..=MAX_FAILED_ATTEMPTS`
/// - `lock_until` is only cleared by a successful authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Opaque card identifier, unique per account.
    pub card_id: String,

    /// Numeric secret compared by exact equality.
    pub pin: u32,

    /// Balance in whole currency units.
    pub balance: u64,

    /// Consecutive wrong PIN entries since the last success.
    pub failed_attempts: u8,

    /// End of the current lockout, if one was ever applied and not yet
    /// cleared. May lie in the past.
    pub lock_until: Option<DateTime<Utc>>,
}

impl Account {
    /// Creates an unlocked account with no failed attempts.
    pub fn new(card_id: impl Into<String>, pin: u32, balance: u64) -> Self {
        Account {
            card_id: card_id.into(),
            pin,
            balance,
            failed_attempts: 0,
            lock_until: None,
        }
    }

    /// Returns the lock state as observed at `now`.
    pub fn lock_state(&self, now: DateTime<Utc>) -> LockState {
        LockState::at(self.lock_until, now)
    }

    /// Adds funds to the balance.
    ///
    /// Returns `false` for a zero amount or if the balance would exceed
    /// [`MAX_BALANCE`].
    pub fn deposit(&mut self, amount: u64) -> bool {
        if amount == 0 {
            return false;
        }

        match self
            .balance
            .checked_add(amount)
            .filter(|balance| *balance <= MAX_BALANCE)
        {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Removes funds from the balance.
    ///
    /// Returns `false` for a zero amount or if `amount > balance`.
    pub fn withdraw(&mut self, amount: u64) -> bool {
        if amount == 0 || amount > self.balance {
            return false;
        }

        self.balance -= amount;
        true
    }
}
