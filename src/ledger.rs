//! The ledger service: records movements and settles payments.
//!
//! A movement request is validated (amount, account, operation type), signed
//! according to its operation type and stored. Payments additionally settle
//! the account's outstanding debits oldest first; the payment and every
//! resulting balance update are committed together.

use crate::account::{AccountDirectory, AccountId};
use crate::allocator::{allocate, total_settled};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::locks::AccountLocks;
use crate::money::Cents;
use crate::movement::{unsettled_total, Movement, NewMovement, RecordedMovement};
use crate::operation::{OperationType, OperationTypeCatalog};
use crate::store::MovementStore;
use log::{debug, info, warn};
use rust_decimal::Decimal;

/// Records movements against accounts and keeps debits settled.
///
/// Safe to share between threads. Payments for the same account are
/// serialized from the read of outstanding debits through the commit;
/// everything else runs in parallel.
pub struct Ledger<S, A, O> {
    store: S,
    accounts: A,
    operation_types: O,
    config: LedgerConfig,
    locks: AccountLocks,
}

impl<S, A, O> Ledger<S, A, O>
where
    S: MovementStore,
    A: AccountDirectory,
    O: OperationTypeCatalog,
{
    /// Creates a ledger over the given storage and collaborators.
    pub fn new(store: S, accounts: A, operation_types: O, config: LedgerConfig) -> Self {
        Ledger {
            store,
            accounts,
            operation_types,
            config,
            locks: AccountLocks::new(),
        }
    }

    /// Records a movement of `raw_amount` (a positive magnitude with at most
    /// two decimals; the sign comes from the operation type).
    ///
    /// # Errors
    ///
    /// - `AmountInvalid` for a non-positive, too large or too precise amount
    /// - `AccountNotFound` / `OperationTypeInvalid` when a collaborator says no
    /// - `Persistence` when storage or a collaborator fails
    /// - `AllocationFailure` / `Conflict` when the settlement commit is
    ///   rejected; nothing is stored in that case
    pub fn record_movement(
        &self,
        account_id: AccountId,
        operation_type_id: i64,
        raw_amount: Decimal,
    ) -> Result<RecordedMovement> {
        let magnitude = self.check_amount(Cents::from_decimal(raw_amount)?)?;
        self.record(account_id, operation_type_id, magnitude)
    }

    /// Same as [`Ledger::record_movement`] for callers holding a float.
    ///
    /// The precision check happens here; no float arithmetic happens after it.
    pub fn record_movement_f64(
        &self,
        account_id: AccountId,
        operation_type_id: i64,
        raw_amount: f64,
    ) -> Result<RecordedMovement> {
        let magnitude = self.check_amount(Cents::from_f64(raw_amount)?)?;
        self.record(account_id, operation_type_id, magnitude)
    }

    /// Outstanding debt of an account as a non-negative amount.
    ///
    /// Fails with `AmountInvalid` when the debt is too large to represent.
    pub fn outstanding_debt(&self, account_id: AccountId) -> Result<Cents> {
        let movements = self.store.movements_for_account(account_id)?;
        let total = unsettled_total(&movements)?;
        total.checked_neg().ok_or_else(|| LedgerError::AmountInvalid {
            amount: total.to_string(),
            reason: "outstanding debt out of range",
        })
    }

    /// Every movement of an account, oldest first.
    pub fn movements(&self, account_id: AccountId) -> Result<Vec<Movement>> {
        self.store.movements_for_account(account_id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn check_amount(&self, amount: Cents) -> Result<Cents> {
        if !amount.is_positive() {
            return Err(LedgerError::AmountInvalid {
                amount: amount.to_string(),
                reason: "must be positive",
            });
        }
        if amount > self.config.max_amount {
            return Err(LedgerError::AmountInvalid {
                amount: amount.to_string(),
                reason: "exceeds the configured maximum",
            });
        }
        Ok(amount)
    }

    fn record(
        &self,
        account_id: AccountId,
        operation_type_id: i64,
        magnitude: Cents,
    ) -> Result<RecordedMovement> {
        self.ensure_account_exists(account_id)?;
        let operation_type = self.resolve_operation_type(operation_type_id)?;

        let pending = NewMovement::new(account_id, operation_type, magnitude);
        let stored = if operation_type.is_payment() {
            self.locks
                .with_account(account_id, || self.settle(pending))?
        } else {
            self.store.commit(pending, &[])?
        };

        debug!(
            "Recorded {} {} of {} for account {}",
            stored.operation_type, stored.id, magnitude, account_id
        );
        Ok(RecordedMovement::from(&stored))
    }

    /// Allocates a payment over the account's outstanding debits and commits
    /// it. Must run inside the account's exclusive section.
    fn settle(&self, payment: NewMovement) -> Result<Movement> {
        let account_id = payment.account_id;
        let outstanding = self.store.find_unsettled_debits(account_id)?;
        let updates = allocate(payment.amount, &outstanding);
        let settled = total_settled(&updates);

        let stored = self.store.commit(payment, &updates).map_err(|e| {
            warn!("Payment for account {} not recorded: {}", account_id, e);
            e
        })?;

        if updates.is_empty() {
            debug!(
                "Payment {} for account {} found no outstanding debits",
                stored.id, account_id
            );
        } else {
            info!(
                "Payment {} settled {} across {} debit(s) for account {}",
                stored.id,
                settled,
                updates.len(),
                account_id
            );
        }
        Ok(stored)
    }

    fn ensure_account_exists(&self, account_id: AccountId) -> Result<()> {
        let exists = self.accounts.exists(account_id).map_err(|e| {
            LedgerError::Persistence(format!("account lookup for {} failed: {}", account_id, e))
        })?;
        if !exists {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        Ok(())
    }

    fn resolve_operation_type(&self, operation_type_id: i64) -> Result<OperationType> {
        let exists = self
            .operation_types
            .exists(operation_type_id)
            .map_err(|e| {
                LedgerError::Persistence(format!(
                    "operation type lookup for {} failed: {}",
                    operation_type_id, e
                ))
            })?;
        if !exists {
            return Err(LedgerError::OperationTypeInvalid(operation_type_id));
        }
        OperationType::from_id(operation_type_id)
            .ok_or(LedgerError::OperationTypeInvalid(operation_type_id))
    }
}
