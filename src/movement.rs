//! Movement models: the stored record, the pending insert and the public result.

use crate::account::AccountId;
use crate::error::Result;
use crate::money::Cents;
use crate::operation::OperationType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Globally unique movement identifier, assigned by storage.
pub type MovementId = Uuid;

/// A recorded financial movement against an account.
///
/// # Invariants
///
/// - `amount` never changes after creation. Debits are `<= 0`, payments `>= 0`.
/// - For debits, `unsettled_balance` starts at `amount` and only moves toward
///   zero; it never changes sign.
/// - Payments keep `unsettled_balance` at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub operation_type: OperationType,
    pub amount: Cents,
    pub unsettled_balance: Cents,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    /// Returns `true` for a debit with nothing left owing.
    pub fn is_settled(&self) -> bool {
        self.operation_type.is_debit() && self.unsettled_balance.is_zero()
    }

    /// Returns `true` for a debit that still has a negative unsettled balance.
    pub fn is_outstanding(&self) -> bool {
        self.operation_type.is_debit() && self.unsettled_balance.is_negative()
    }
}

/// A movement that has been validated and signed but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub account_id: AccountId,
    pub operation_type: OperationType,
    pub amount: Cents,
    pub unsettled_balance: Cents,
}

impl NewMovement {
    /// Signs `magnitude` for `operation_type` and initializes the unsettled
    /// balance: equal to the amount for debits, zero for payments.
    pub fn new(account_id: AccountId, operation_type: OperationType, magnitude: Cents) -> Self {
        let amount = operation_type.signed(magnitude);
        let unsettled_balance = if operation_type.is_debit() {
            amount
        } else {
            Cents::ZERO
        };

        NewMovement {
            account_id,
            operation_type,
            amount,
            unsettled_balance,
        }
    }
}

/// What `record_movement` hands back to its caller.
///
/// `amount` is the magnitude the caller supplied; the storage sign convention
/// stays internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedMovement {
    pub id: MovementId,
    pub account_id: AccountId,
    pub operation_type_id: i64,
    pub amount: Cents,
    pub occurred_at: DateTime<Utc>,
}

impl From<&Movement> for RecordedMovement {
    fn from(movement: &Movement) -> Self {
        RecordedMovement {
            id: movement.id,
            account_id: movement.account_id,
            operation_type_id: movement.operation_type.id(),
            amount: movement.amount.abs(),
            occurred_at: movement.occurred_at,
        }
    }
}

/// Sum of debit unsettled balances: the account's outstanding debt, negated.
///
/// Fails with `AmountInvalid` if the total does not fit in `i64` minor units.
pub fn unsettled_total(movements: &[Movement]) -> Result<Cents> {
    Cents::try_sum(
        movements
            .iter()
            .filter(|m| m.operation_type.is_debit())
            .map(|m| m.unsettled_balance),
    )
}
