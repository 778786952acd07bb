//! Operation types and the catalog that vouches for them.

use crate::error::Result;
use crate::money::Cents;
use serde::Serialize;
use std::fmt;

/// Kind of movement. The discriminant is the catalog id.
///
/// Purchases, installment purchases and withdrawals are debits and are stored
/// with a non-positive amount. Payments are credits, stored non-negative, and
/// are the only kind that settles outstanding debits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Purchase = 1,
    InstallmentPurchase = 2,
    Withdrawal = 3,
    Payment = 4,
}

impl OperationType {
    /// Every member of the fixed enumeration, in id order.
    pub const ALL: [OperationType; 4] = [
        OperationType::Purchase,
        OperationType::InstallmentPurchase,
        OperationType::Withdrawal,
        OperationType::Payment,
    ];

    /// Looks up an operation type by catalog id.
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.id() == id)
    }

    /// Catalog id.
    pub fn id(self) -> i64 {
        self as i64
    }

    /// Returns `true` for purchases, installment purchases and withdrawals.
    pub fn is_debit(self) -> bool {
        !self.is_payment()
    }

    /// Returns `true` for payments.
    pub fn is_payment(self) -> bool {
        self == OperationType::Payment
    }

    /// Applies the storage sign convention to a magnitude.
    pub fn signed(self, amount: Cents) -> Cents {
        if self.is_debit() {
            -amount.abs()
        } else {
            amount.abs()
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationType::Purchase => "purchase",
            OperationType::InstallmentPurchase => "installment_purchase",
            OperationType::Withdrawal => "withdrawal",
            OperationType::Payment => "payment",
        };
        f.write_str(name)
    }
}

/// Existence check for operation types.
///
/// A catalog error must be reported as an error, never as "does not exist".
pub trait OperationTypeCatalog: Send + Sync {
    fn exists(&self, operation_type_id: i64) -> Result<bool>;
}

/// Catalog backed by the fixed enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticOperationTypeCatalog;

impl OperationTypeCatalog for StaticOperationTypeCatalog {
    fn exists(&self, operation_type_id: i64) -> Result<bool> {
        Ok(OperationType::from_id(operation_type_id).is_some())
    }
}
