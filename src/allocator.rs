//! Settlement allocation: spreading a payment over outstanding debits.
//!
//! Pure arithmetic. The caller supplies the debits oldest first; the result
//! always updates a prefix of that sequence.

use crate::money::Cents;
use crate::movement::MovementId;

/// A debit that still has money owing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingDebit {
    pub movement_id: MovementId,
    /// Strictly negative.
    pub unsettled_balance: Cents,
}

/// New unsettled balance for one debit.
///
/// `previous_balance` is what the allocator saw; stores compare it with the
/// current value to detect concurrent settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub movement_id: MovementId,
    pub previous_balance: Cents,
    pub new_balance: Cents,
}

impl BalanceUpdate {
    /// Portion of the payment applied to this debit.
    pub fn settled(&self) -> Cents {
        self.new_balance - self.previous_balance
    }
}

/// Allocates `payment` across `outstanding`, oldest first.
///
/// Each debit is fully settled (new balance zero) while the payment lasts.
/// The first debit the payment cannot cover gets the shortfall as its new
/// balance and allocation stops there. Stops as soon as the payment is
/// exhausted, so nothing past an exact cover is touched.
///
/// A non-positive payment, or an empty `outstanding`, yields no updates.
/// Entries that are not negative are skipped.
pub fn allocate(payment: Cents, outstanding: &[OutstandingDebit]) -> Vec<BalanceUpdate> {
    let mut updates = Vec::new();
    let mut remaining = payment;

    for debit in outstanding {
        if !remaining.is_positive() {
            break;
        }
        if !debit.unsettled_balance.is_negative() {
            continue;
        }

        let owed = -debit.unsettled_balance;
        remaining -= owed;

        let new_balance = if remaining.is_negative() {
            remaining
        } else {
            Cents::ZERO
        };
        updates.push(BalanceUpdate {
            movement_id: debit.movement_id,
            previous_balance: debit.unsettled_balance,
            new_balance,
        });
    }

    updates
}

/// Total amount settled by a set of updates.
pub fn total_settled(updates: &[BalanceUpdate]) -> Cents {
    updates.iter().map(BalanceUpdate::settled).sum()
}
