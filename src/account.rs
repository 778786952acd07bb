//! Account records and the directory that answers existence checks.
//!
//! The ledger only ever asks whether an account exists. Creation and lookup
//! are here so the binary and tests have something to ask.

use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Opaque positive account identifier.
pub type AccountId = u64;

/// An account holder record.
///
/// `document_number` is fixed at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub document_number: String,
    pub created_at: DateTime<Utc>,
}

/// Existence check for accounts.
///
/// A lookup failure must be reported as an error, never as "does not exist".
pub trait AccountDirectory: Send + Sync {
    fn exists(&self, account_id: AccountId) -> Result<bool>;
}

/// In-memory account directory with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
}

impl InMemoryAccountDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new account and returns it with its assigned id.
    pub fn create(&self, document_number: &str) -> Result<Account> {
        let document_number = document_number.trim();
        if document_number.is_empty() {
            return Err(LedgerError::DocumentNumberInvalid);
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| LedgerError::poisoned("account directory", e))?;

        let id = accounts.keys().next_back().map_or(1, |last| last + 1);
        let account = Account {
            id,
            document_number: document_number.to_string(),
            created_at: Utc::now(),
        };
        accounts.insert(id, account.clone());

        debug!("Created account {} ({})", id, account.document_number);
        Ok(account)
    }

    /// Looks up an account by id.
    pub fn get(&self, account_id: AccountId) -> Result<Option<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| LedgerError::poisoned("account directory", e))?;
        Ok(accounts.get(&account_id).cloned())
    }

    /// All accounts ordered by id.
    pub fn list(&self) -> Result<Vec<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| LedgerError::poisoned("account directory", e))?;
        Ok(accounts.values().cloned().collect())
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn exists(&self, account_id: AccountId) -> Result<bool> {
        Ok(self.get(account_id)?.is_some())
    }
}
