//! Interactive prompt loop.
//!
//! Reads from any [`BufRead`] and writes to any [`Write`], so the binary
//! drives it with stdin/stdout and tests drive it with byte buffers. End of
//! input behaves like typing `exit`.

use crate::account::Account;
use crate::atm::{Atm, Operation, Outcome};
use crate::error::{AtmError, Result};
use crate::lockout::{AuthOutcome, LOCKOUT_HOURS};
use crate::store::AccountStore;
use log::error;
use std::io::{BufRead, Write};
use std::str::FromStr;

const MENU: &str = "\n1. Check Balance\n2. Deposit\n3. Withdraw\n4. Exit";

/// Parses a numeric field, rejecting anything that is not a non-negative
/// integer in range for `T`.
pub fn parse_number<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AtmError::InvalidInput(format!("{} must be a whole number", field)))
}

/// A terminal session over an [`Atm`].
pub struct Terminal<S, R, W> {
    atm: Atm<S>,
    input: R,
    output: W,
}

impl<S: AccountStore, R: BufRead, W: Write> Terminal<S, R, W> {
    pub fn new(atm: Atm<S>, input: R, output: W) -> Self {
        Terminal { atm, input, output }
    }

    /// Runs card sessions until `exit` or end of input.
    ///
    /// Only terminal I/O failures end the run with an error; storage failures
    /// abort the operation in progress and are reported to the user.
    pub fn run(&mut self) -> Result<()> {
        while let Some(card) = self.prompt("\nInsert ATM Card (or 'exit'): ")? {
            if card == "exit" {
                break;
            }

            match self.atm.insert_card(&card) {
                Ok(Some(mut account)) => self.menu(&mut account)?,
                Ok(None) => writeln!(self.output, "Invalid card")?,
                Err(e) => self.report(e)?,
            }
        }

        writeln!(self.output, "ATM shut down")?;
        self.output.flush()?;
        Ok(())
    }

    fn menu(&mut self, account: &mut Account) -> Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("Choose option: ")? else {
                return Ok(());
            };

            let needs_amount = match choice.as_str() {
                "1" => false,
                "2" | "3" => true,
                "4" => return Ok(()),
                _ => {
                    writeln!(self.output, "Invalid option")?;
                    continue;
                }
            };

            let Some(pin) = self.read_number::<u32>("PIN", "Enter PIN: ")? else {
                return Ok(());
            };
            let amount = if needs_amount {
                match self.read_number::<u64>("Amount", "Enter amount: ")? {
                    Some(amount) => amount,
                    None => return Ok(()),
                }
            } else {
                0
            };

            let op = match choice.as_str() {
                "2" => Operation::Deposit(amount),
                "3" => Operation::Withdraw(amount),
                _ => Operation::CheckBalance,
            };

            match self.atm.execute(account, pin, op) {
                Ok(outcome) => self.show(outcome)?,
                Err(e) => self.report(e)?,
            }
        }
    }

    fn show(&mut self, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::Denied(AuthOutcome::WrongPin { .. }) => writeln!(self.output, "Wrong PIN")?,
            Outcome::Denied(AuthOutcome::LockedOut { .. }) => {
                writeln!(self.output, "Wrong PIN")?;
                writeln!(self.output, "Account locked for {} hours", LOCKOUT_HOURS)?;
            }
            Outcome::Denied(AuthOutcome::Refused { .. }) => writeln!(
                self.output,
                "Account locked. Try after {} hours",
                LOCKOUT_HOURS
            )?,
            Outcome::Denied(AuthOutcome::Accepted) => {}
            Outcome::Balance(balance) => writeln!(self.output, "Balance: {}", balance)?,
            Outcome::Deposited { .. } => writeln!(self.output, "Amount deposited")?,
            Outcome::Dispensed { .. } => writeln!(self.output, "Collect cash")?,
            Outcome::InsufficientBalance { .. } => {
                writeln!(self.output, "Insufficient balance")?
            }
            Outcome::InvalidAmount => writeln!(self.output, "Amount must be positive")?,
            Outcome::AmountTooLarge { .. } => {
                writeln!(self.output, "Amount exceeds account limit")?
            }
        }
        Ok(())
    }

    /// Prints a non-fatal error and lets the session continue. Terminal I/O
    /// errors are passed back up.
    fn report(&mut self, err: AtmError) -> Result<()> {
        if let AtmError::Io(_) = err {
            return Err(err);
        }
        error!("Operation aborted: {}", err);
        writeln!(self.output, "Operation failed: {}", err)?;
        Ok(())
    }

    /// Prompts until a valid number is entered. `None` on end of input.
    fn read_number<T: FromStr>(&mut self, field: &str, prompt: &str) -> Result<Option<T>> {
        while let Some(line) = self.prompt(prompt)? {
            match parse_number(field, &line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) if e.is_recoverable() => writeln!(self.output, "Invalid input")?,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Writes `prompt` and reads one trimmed line. `None` on end of input.
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
