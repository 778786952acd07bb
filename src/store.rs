//! Storage contract for movements.

use crate::account::AccountId;
use crate::allocator::{BalanceUpdate, OutstandingDebit};
use crate::error::Result;
use crate::movement::{Movement, NewMovement};

/// Durable, queryable storage of movements.
///
/// Implementations must be safe to share between threads; the ledger calls
/// them concurrently for different accounts.
pub trait MovementStore: Send + Sync {
    /// Debits of `account_id` with a non-zero unsettled balance, oldest
    /// `occurred_at` first, ties broken by ascending movement id.
    ///
    /// Never returns payments. Two calls with no write in between return the
    /// same sequence.
    fn find_unsettled_debits(&self, account_id: AccountId) -> Result<Vec<OutstandingDebit>>;

    /// Inserts `movement` and applies `updates` as a single atomic unit.
    ///
    /// The store assigns the id and the `occurred_at` timestamp and leaves
    /// every other field as given. Either the movement is stored and every
    /// update applied, or nothing changes.
    ///
    /// Each update must target a debit of the same account, must not change
    /// the sign of its balance and must not move it away from zero; otherwise
    /// the commit fails with `AllocationFailure`. An update whose
    /// `previous_balance` no longer matches storage fails with `Conflict`.
    fn commit(&self, movement: NewMovement, updates: &[BalanceUpdate]) -> Result<Movement>;

    /// Every movement of `account_id`, in the same order as
    /// [`MovementStore::find_unsettled_debits`].
    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>>;
}
