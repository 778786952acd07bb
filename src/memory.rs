//! In-memory [`MovementStore`].
//!
//! All state sits behind one `RwLock`. A commit validates every balance
//! update against the current state before touching anything, then inserts
//! and applies under the same write guard, so readers never see half of a
//! settlement.

use crate::account::AccountId;
use crate::allocator::{BalanceUpdate, OutstandingDebit};
use crate::error::{LedgerError, Result};
use crate::movement::{Movement, MovementId, NewMovement};
use crate::store::MovementStore;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;

/// Source of `occurred_at` timestamps.
///
/// The store never issues a timestamp earlier than one it already issued; a
/// reading that goes backward is clamped to the previous one and the tie is
/// broken by movement id.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct StoreState {
    movements: HashMap<MovementId, Movement>,
    /// Index: account_id -> movement ids in insertion order
    by_account: HashMap<AccountId, Vec<MovementId>>,
    last_occurred_at: Option<DateTime<Utc>>,
}

impl StoreState {
    /// Clamps `now` to the last issued timestamp. Issued timestamps never decrease.
    fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let occurred_at = match self.last_occurred_at {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_occurred_at = Some(occurred_at);
        occurred_at
    }

    fn ordered_for_account(&self, account_id: AccountId) -> Vec<&Movement> {
        let mut movements: Vec<&Movement> = self
            .by_account
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.movements.get(id))
            .collect();
        movements.sort_by_key(|m| (m.occurred_at, m.id));
        movements
    }

    /// Checks one update against the stored movement without mutating it.
    fn check_update(&self, account_id: AccountId, update: &BalanceUpdate) -> Result<()> {
        let failure = |message: String| LedgerError::AllocationFailure {
            movement_id: update.movement_id,
            message,
        };

        let movement = self
            .movements
            .get(&update.movement_id)
            .ok_or_else(|| failure("movement not found".to_string()))?;

        if movement.account_id != account_id {
            return Err(failure(format!(
                "movement belongs to account {}, not {}",
                movement.account_id, account_id
            )));
        }
        if !movement.operation_type.is_debit() {
            return Err(failure("payments carry no unsettled balance".to_string()));
        }
        if movement.unsettled_balance != update.previous_balance {
            return Err(LedgerError::Conflict {
                movement_id: update.movement_id,
                message: format!(
                    "expected unsettled balance {}, found {}",
                    update.previous_balance, movement.unsettled_balance
                ),
            });
        }
        if update.new_balance.is_positive() {
            return Err(failure(format!(
                "new balance {} would change sign",
                update.new_balance
            )));
        }
        if update.new_balance < movement.unsettled_balance {
            return Err(failure(format!(
                "new balance {} moves away from zero (currently {})",
                update.new_balance, movement.unsettled_balance
            )));
        }
        Ok(())
    }
}

/// Movement store kept in process memory.
pub struct InMemoryMovementStore {
    state: RwLock<StoreState>,
    clock: Clock,
}

impl InMemoryMovementStore {
    /// Creates an empty store stamping movements with the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    /// Creates an empty store with a custom timestamp source.
    pub fn with_clock(clock: Clock) -> Self {
        InMemoryMovementStore {
            state: RwLock::new(StoreState::default()),
            clock,
        }
    }

    /// Looks up a single movement.
    pub fn get(&self, id: MovementId) -> Result<Option<Movement>> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::poisoned("movement store", e))?;
        Ok(state.movements.get(&id).cloned())
    }

    /// Number of stored movements across all accounts.
    pub fn len(&self) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::poisoned("movement store", e))?;
        Ok(state.movements.len())
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn insert(
        state: &mut StoreState,
        movement: NewMovement,
        occurred_at: DateTime<Utc>,
    ) -> Movement {
        let stored = Movement {
            id: Uuid::now_v7(),
            account_id: movement.account_id,
            operation_type: movement.operation_type,
            amount: movement.amount,
            unsettled_balance: movement.unsettled_balance,
            occurred_at,
        };

        state
            .by_account
            .entry(stored.account_id)
            .or_default()
            .push(stored.id);
        state.movements.insert(stored.id, stored.clone());
        stored
    }

    fn apply_balance_updates(state: &mut StoreState, updates: &[BalanceUpdate]) {
        for update in updates {
            if let Some(movement) = state.movements.get_mut(&update.movement_id) {
                movement.unsettled_balance = update.new_balance;
            }
        }
    }
}

impl Default for InMemoryMovementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryMovementStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMovementStore").finish_non_exhaustive()
    }
}

impl MovementStore for InMemoryMovementStore {
    fn find_unsettled_debits(&self, account_id: AccountId) -> Result<Vec<OutstandingDebit>> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::poisoned("movement store", e))?;

        Ok(state
            .ordered_for_account(account_id)
            .into_iter()
            .filter(|m| m.is_outstanding())
            .map(|m| OutstandingDebit {
                movement_id: m.id,
                unsettled_balance: m.unsettled_balance,
            })
            .collect())
    }

    fn commit(&self, movement: NewMovement, updates: &[BalanceUpdate]) -> Result<Movement> {
        let mut state = self
            .state
            .write()
            .map_err(|e| LedgerError::poisoned("movement store", e))?;

        let mut seen = HashSet::with_capacity(updates.len());
        for update in updates {
            if !seen.insert(update.movement_id) {
                return Err(LedgerError::AllocationFailure {
                    movement_id: update.movement_id,
                    message: "movement updated twice in one commit".to_string(),
                });
            }
            if let Err(e) = state.check_update(movement.account_id, update) {
                warn!(
                    "Aborting commit for account {}: {}",
                    movement.account_id, e
                );
                return Err(e);
            }
        }

        let occurred_at = state.next_timestamp((self.clock)());
        let stored = Self::insert(&mut state, movement, occurred_at);
        Self::apply_balance_updates(&mut state, updates);

        debug!(
            "Stored {} {} for account {} with {} balance update(s)",
            stored.operation_type,
            stored.id,
            stored.account_id,
            updates.len()
        );
        Ok(stored)
    }

    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>> {
        let state = self
            .state
            .read()
            .map_err(|e| LedgerError::poisoned("movement store", e))?;
        Ok(state
            .ordered_for_account(account_id)
            .into_iter()
            .cloned()
            .collect())
    }
}
