//! Error types for the ATM terminal.

use thiserror::Error;

/// Result type alias for terminal and store operations
pub type Result<T> = std::result::Result<T, AtmError>;

/// Errors that can occur while running the terminal.
///
/// Rejected PINs, locked accounts and refused withdrawals are not errors;
/// those are reported through [`crate::atm::Outcome`].
#[derive(Error, Debug)]
pub enum AtmError {
    /// Failed to read from or write to the terminal
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The account database could not be opened, read or written
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A persisted row could not be mapped back to an account
    #[error("corrupt record for card {card_id}: {message}")]
    CorruptRecord { card_id: String, message: String },

    /// User input that is not a valid number for the requested field
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AtmError {
    /// Returns `true` if the current operation may be retried by re-prompting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AtmError::InvalidInput(_))
    }
}
