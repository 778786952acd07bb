//! Per-account exclusive sections.
//!
//! Settling a payment reads the account's outstanding debits and then
//! writes new balances. Two payments for the same account must not
//! interleave between those steps; payments for different accounts never
//! wait on each other.

use crate::account::AccountId;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one mutex per account, created on first use.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the exclusive section for `account_id`.
    ///
    /// The registry mutex is only held long enough to fetch the account's
    /// lock, so unrelated accounts proceed in parallel.
    pub fn with_account<T>(
        &self,
        account_id: AccountId,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| LedgerError::poisoned("account lock registry", e))?;
            Arc::clone(locks.entry(account_id).or_default())
        };

        let _guard = lock
            .lock()
            .map_err(|e| LedgerError::poisoned("account", e))?;
        f()
    }
}
