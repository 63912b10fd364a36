//! ATM Terminal CLI
//!
//! Interactive ATM session over a SQLite account file. The file and its
//! table are created on first run and seeded with two demo cards.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- [path/to/atm.db]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use atm_terminal::store::DEFAULT_DB_PATH;
use atm_terminal::{Atm, Result, SqliteStore, Terminal};
use std::env;
use std::io;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let db_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    let store = SqliteStore::open(&db_path)?;
    store.seed_demo_accounts()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut terminal = Terminal::new(Atm::new(store), stdin.lock(), stdout.lock());
    terminal.run()
}
