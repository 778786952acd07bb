//! CSV front end for the binary.
//!
//! Accounts are registered from one file, movements recorded from another,
//! and a per-account report written at the end. Rows that fail to parse or
//! are rejected by the ledger are logged at warn level and skipped.

use crate::account::{AccountDirectory, AccountId, InMemoryAccountDirectory};
use crate::error::{ErrorKind, LedgerError, Result};
use crate::ledger::Ledger;
use crate::money::{out_of_range, Cents};
use crate::operation::OperationTypeCatalog;
use crate::store::MovementStore;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{Read, Write};
use std::str::FromStr;

/// Row of the accounts file.
#[derive(Debug, Deserialize)]
pub struct AccountRecord {
    pub document_number: String,
}

/// Row of the movements file.
///
/// `amount` is a positive magnitude; the sign follows from `operation_type`.
#[derive(Debug, Deserialize)]
pub struct MovementRecord {
    pub account: AccountId,
    pub operation_type: i64,
    pub amount: Option<String>,
}

impl MovementRecord {
    fn parse_amount(&self, row: usize) -> Result<Decimal> {
        let raw = self
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LedgerError::InvalidRecord {
                row,
                message: "missing amount".to_string(),
            })?;

        Decimal::from_str(raw).map_err(|e| LedgerError::InvalidRecord {
            row,
            message: format!("amount {:?}: {}", raw, e),
        })
    }
}

/// Outcome of a movements file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub recorded: usize,
    pub rejected: usize,
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// Registers one account per row. Returns the number created.
pub fn load_accounts_csv<R: Read>(
    directory: &InMemoryAccountDirectory,
    input: R,
) -> Result<usize> {
    let mut created = 0;

    for (row_idx, result) in reader(input).deserialize::<AccountRecord>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        let outcome = result
            .map_err(LedgerError::from)
            .and_then(|record| directory.create(&record.document_number));

        match outcome {
            Ok(account) => {
                debug!("Row {}: Registered account {}", row_num, account.id);
                created += 1;
            }
            Err(e) => warn!("Row {}: {}", row_num, e),
        }
    }

    Ok(created)
}

/// Records one movement per row, in file order.
///
/// Storage failures abort the batch; everything else rejects just the row.
pub fn process_movements_csv<R, S, A, O>(
    ledger: &Ledger<S, A, O>,
    input: R,
) -> Result<BatchSummary>
where
    R: Read,
    S: MovementStore,
    A: AccountDirectory,
    O: OperationTypeCatalog,
{
    let mut summary = BatchSummary::default();

    for (row_idx, result) in reader(input).deserialize::<MovementRecord>().enumerate() {
        let row_num = row_idx + 2;

        let outcome = result.map_err(LedgerError::from).and_then(|record| {
            let amount = record.parse_amount(row_num)?;
            ledger.record_movement(record.account, record.operation_type, amount)
        });

        match outcome {
            Ok(recorded) => {
                debug!("Row {}: Recorded movement {}", row_num, recorded.id);
                summary.recorded += 1;
            }
            Err(e) if e.kind() == ErrorKind::Persistence => return Err(e),
            Err(e) => {
                warn!("Row {}: {}", row_num, e);
                summary.rejected += 1;
            }
        }
    }

    Ok(summary)
}

/// Writes one line per account, sorted by account id:
/// total debits, total payments and outstanding debt, all two-decimal.
pub fn write_report<W, S, O>(
    ledger: &Ledger<S, InMemoryAccountDirectory, O>,
    output: W,
) -> Result<()>
where
    W: Write,
    S: MovementStore,
    O: OperationTypeCatalog,
{
    let mut csv_writer = csv::Writer::from_writer(output);

    csv_writer.write_record(["account", "document_number", "debits", "payments", "outstanding"])?;

    for account in ledger.accounts().list()? {
        let movements = ledger.movements(account.id)?;

        let (debits, payments) =
            movements
                .iter()
                .try_fold((Cents::ZERO, Cents::ZERO), |(debits, payments), m| {
                    let amount = m.amount.abs();
                    if m.operation_type.is_debit() {
                        let debits = debits
                            .checked_add(amount)
                            .ok_or_else(|| out_of_range(debits, amount))?;
                        Ok::<_, LedgerError>((debits, payments))
                    } else {
                        let payments = payments
                            .checked_add(amount)
                            .ok_or_else(|| out_of_range(payments, amount))?;
                        Ok((debits, payments))
                    }
                })?;

        csv_writer.write_record([
            account.id.to_string(),
            account.document_number.clone(),
            debits.to_string(),
            payments.to_string(),
            ledger.outstanding_debt(account.id)?.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
