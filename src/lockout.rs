//! PIN lockout state machine.
//!
//! The transition is a pure function of the account, the submitted PIN and
//! the current time, so it can be exercised without touching storage.
//!
//! ```text
//!   Unlocked --wrong PIN (count < 3)--> Unlocked
//!   Unlocked --wrong PIN (count = 3)--> Locked { until: now + 24h }
//!   Unlocked --correct PIN-----------> Unlocked (count = 0, lock cleared)
//!   Locked   --any PIN, now < until---> Locked (no change)
//! ```
//!
//! A lock whose expiry has passed reads as `Unlocked`, but the stored
//! `lock_until` is only cleared by a correct PIN. A wrong PIN after expiry
//! takes the ordinary mismatch path.
//!
//! The failure counter saturates at [`MAX_FAILED_ATTEMPTS`]. An account whose
//! lock expired without a correct PIN in between is still at the limit, so a
//! single wrong PIN locks it again for another [`LOCKOUT_HOURS`] hours rather
//! than counting past the limit and never locking.

use crate::account::Account;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

/// Wrong PIN entries that trigger a lockout.
pub const MAX_FAILED_ATTEMPTS: u8 = 3;

/// Length of a lockout in hours.
pub const LOCKOUT_HOURS: i64 = 24;

/// Length of a lockout.
pub fn lockout_duration() -> Duration {
    Duration::hours(LOCKOUT_HOURS)
}

/// Whether an account currently accepts PIN entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { until: DateTime<Utc> },
}

impl LockState {
    /// Derives the state from a stored lock expiry as seen at `now`.
    pub fn at(lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match lock_until {
            Some(until) if now < until => LockState::Locked { until },
            _ => LockState::Unlocked,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }
}

/// Result of a single PIN check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// PIN matched; attempts reset and any lock cleared.
    Accepted,

    /// PIN did not match; `attempts` is the new consecutive failure count.
    WrongPin { attempts: u8 },

    /// PIN did not match and this attempt applied a lockout.
    LockedOut { until: DateTime<Utc> },

    /// The account was already locked; the PIN was not checked.
    Refused { until: DateTime<Utc> },
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted)
    }

    /// Returns `true` if the transition changed the account and it must be
    /// persisted.
    pub fn requires_save(&self) -> bool {
        !matches!(self, AuthOutcome::Refused { .. })
    }
}

/// Applies one PIN submission to `account` at time `now`.
///
/// Mutates `account` in memory only; persisting it is the caller's job
/// whenever [`AuthOutcome::requires_save`] holds.
pub fn authenticate(account: &mut Account, pin: u32, now: DateTime<Utc>) -> AuthOutcome {
    if let LockState::Locked { until } = account.lock_state(now) {
        warn!("Card {}: refused while locked until {}", account.card_id, until);
        return AuthOutcome::Refused { until };
    }

    if pin != account.pin {
        // Saturates so the counter stays in range when a lock has expired
        // without a successful entry in between.
        account.failed_attempts = account.failed_attempts.saturating_add(1).min(MAX_FAILED_ATTEMPTS);
        warn!(
            "Card {}: wrong PIN ({}/{})",
            account.card_id, account.failed_attempts, MAX_FAILED_ATTEMPTS
        );

        if account.failed_attempts == MAX_FAILED_ATTEMPTS {
            let until = now + lockout_duration();
            account.lock_until = Some(until);
            info!("Card {}: locked until {}", account.card_id, until);
            return AuthOutcome::LockedOut { until };
        }

        return AuthOutcome::WrongPin {
            attempts: account.failed_attempts,
        };
    }

    account.failed_attempts = 0;
    account.lock_until = None;
    AuthOutcome::Accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new("1111-2222-3333", 1234, 5000)
    }

    #[test]
    fn test_lock_state_from_optional_expiry() {
        let now = Utc::now();
        assert_eq!(LockState::at(None, now), LockState::Unlocked);
        assert_eq!(
            LockState::at(Some(now - Duration::seconds(1)), now),
            LockState::Unlocked
        );
        assert_eq!(LockState::at(Some(now), now), LockState::Unlocked);
        let until = now + Duration::seconds(1);
        assert_eq!(LockState::at(Some(until), now), LockState::Locked { until });
    }

    #[test]
    fn test_correct_pin_accepted() {
        let mut acc = account();
        let outcome = authenticate(&mut acc, 1234, Utc::now());
        assert_eq!(outcome, AuthOutcome::Accepted);
        assert!(outcome.requires_save());
    }

    #[test]
    fn test_three_wrong_pins_lock_for_24_hours() {
        let now = Utc::now();
        let mut acc = account();

        assert_eq!(
            authenticate(&mut acc, 0, now),
            AuthOutcome::WrongPin { attempts: 1 }
        );
        assert_eq!(
            authenticate(&mut acc, 0, now),
            AuthOutcome::WrongPin { attempts: 2 }
        );
        let until = now + Duration::hours(24);
        assert_eq!(authenticate(&mut acc, 0, now), AuthOutcome::LockedOut { until });
        assert_eq!(acc.failed_attempts, 3);
        assert_eq!(acc.lock_until, Some(until));
    }

    #[test]
    fn test_correct_pin_resets_attempts() {
        let now = Utc::now();
        let mut acc = account();
        authenticate(&mut acc, 1, now);
        authenticate(&mut acc, 2, now);
        assert_eq!(acc.failed_attempts, 2);

        assert!(authenticate(&mut acc, 1234, now).is_accepted());
        assert_eq!(acc.failed_attempts, 0);
        assert!(acc.lock_until.is_none());
    }

    #[test]
    fn test_locked_account_refuses_any_pin_without_change() {
        let now = Utc::now();
        let mut acc = account();
        for _ in 0..3 {
            authenticate(&mut acc, 0, now);
        }
        let before = acc.clone();
        let later = now + Duration::hours(23);

        let outcome = authenticate(&mut acc, 1234, later);
        assert!(matches!(outcome, AuthOutcome::Refused { .. }));
        assert!(!outcome.requires_save());
        assert_eq!(authenticate(&mut acc, 0, later), outcome);
        assert_eq!(acc, before);
    }

    #[test]
    fn test_correct_pin_after_expiry_clears_lock() {
        let now = Utc::now();
        let mut acc = account();
        for _ in 0..3 {
            authenticate(&mut acc, 0, now);
        }

        let after = now + Duration::hours(24) + Duration::seconds(1);
        assert!(authenticate(&mut acc, 1234, after).is_accepted());
        assert_eq!(acc.failed_attempts, 0);
        assert!(acc.lock_until.is_none());
    }

    #[test]
    fn test_wrong_pin_after_expiry_keeps_stale_lock_and_relocks() {
        let now = Utc::now();
        let mut acc = account();
        for _ in 0..3 {
            authenticate(&mut acc, 0, now);
        }

        let after = now + Duration::hours(25);
        let outcome = authenticate(&mut acc, 0, after);
        assert_eq!(
            outcome,
            AuthOutcome::LockedOut {
                until: after + Duration::hours(24)
            }
        );
        assert_eq!(acc.failed_attempts, MAX_FAILED_ATTEMPTS);
    }

    #[test]
    fn test_wrong_pin_after_partial_failures_and_expired_lock() {
        // Stale lock field with a low counter: the mismatch path runs and
        // the expired timestamp is left in place.
        let now = Utc::now();
        let mut acc = account();
        let stale = now - Duration::hours(1);
        acc.lock_until = Some(stale);

        assert_eq!(
            authenticate(&mut acc, 9, now),
            AuthOutcome::WrongPin { attempts: 1 }
        );
        assert_eq!(acc.lock_until, Some(stale));
    }
}
