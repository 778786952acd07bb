//! Error types for the settlement ledger.

use crate::account::AccountId;
use crate::movement::MovementId;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse classification of a [`LedgerError`].
///
/// Callers use this to decide what to do with a failed `record_movement`:
/// only [`ErrorKind::Conflict`] is safe to retry as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input. Correct and resend.
    Validation,
    /// Referenced account or operation type does not exist.
    NotFound,
    /// Concurrent settlement detected by storage. Nothing was committed.
    Conflict,
    /// Storage or a collaborator failed.
    Persistence,
}

/// Errors that can occur while recording movements.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Raw amount is non-positive, non-finite, too large or has more than two decimals
    #[error("Invalid amount {amount}: {reason}")]
    AmountInvalid { amount: String, reason: &'static str },

    /// Account collaborator reports the account does not exist
    #[error("Account {0} does not exist")]
    AccountNotFound(AccountId),

    /// Operation type is unknown to the catalog or outside the fixed enumeration
    #[error("Operation type {0} is not valid")]
    OperationTypeInvalid(i64),

    /// Account document number is blank
    #[error("Document number must not be blank")]
    DocumentNumberInvalid,

    /// Stored balance changed between read and commit
    #[error("Settlement conflict on movement {movement_id}: {message}")]
    Conflict {
        movement_id: MovementId,
        message: String,
    },

    /// A balance update was rejected while applying a settlement
    #[error("Allocation failed on movement {movement_id}: {message}")]
    AllocationFailure {
        movement_id: MovementId,
        message: String,
    },

    /// Storage or collaborator failure
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid input record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: settlement-ledger <accounts.csv> <movements.csv>")]
    MissingArgument,
}

impl LedgerError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AmountInvalid { .. }
            | LedgerError::DocumentNumberInvalid
            | LedgerError::Config(_)
            | LedgerError::Csv(_)
            | LedgerError::InvalidRecord { .. }
            | LedgerError::MissingArgument => ErrorKind::Validation,
            LedgerError::AccountNotFound(_) | LedgerError::OperationTypeInvalid(_) => {
                ErrorKind::NotFound
            }
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::AllocationFailure { .. }
            | LedgerError::Persistence(_)
            | LedgerError::Io(_) => ErrorKind::Persistence,
        }
    }

    /// Returns `true` if the whole call may be retried from scratch.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Builds a [`LedgerError::Persistence`] from a poisoned lock.
    pub(crate) fn poisoned<T>(what: &str, err: std::sync::PoisonError<T>) -> Self {
        LedgerError::Persistence(format!("{} lock poisoned: {}", what, err))
    }
}
