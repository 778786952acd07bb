//! Settlement Ledger CLI
//!
//! Registers accounts, records movements in file order and prints each
//! account's debits, payments and outstanding debt.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv movements.csv > report.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `LEDGER_MAX_AMOUNT`: Largest accepted movement amount (default `1000000000.00`)

use log::info;
use settlement_ledger::batch::{load_accounts_csv, process_movements_csv, write_report};
use settlement_ledger::{
    InMemoryAccountDirectory, InMemoryMovementStore, Ledger, LedgerConfig, LedgerError, Result,
    StaticOperationTypeCatalog,
};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(LedgerError::MissingArgument);
    }

    let config = LedgerConfig::from_env()?;
    let ledger = Ledger::new(
        InMemoryMovementStore::new(),
        InMemoryAccountDirectory::new(),
        StaticOperationTypeCatalog,
        config,
    );

    let accounts = BufReader::new(File::open(&args[1])?);
    let created = load_accounts_csv(ledger.accounts(), accounts)?;
    info!("Registered {} account(s)", created);

    let movements = BufReader::new(File::open(&args[2])?);
    let summary = process_movements_csv(&ledger, movements)?;
    info!(
        "Recorded {} movement(s), rejected {}",
        summary.recorded, summary.rejected
    );

    let stdout = io::stdout();
    let handle = stdout.lock();
    write_report(&ledger, handle)?;

    Ok(())
}
