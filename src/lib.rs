//! # Settlement Ledger
//!
//! Records purchases, installment purchases, withdrawals and payments against
//! accounts, and settles each account's outstanding debits whenever a payment
//! arrives.
//!
//! ## Design Principles
//!
//! - **Integer minor units**: amounts are checked for two-decimal precision
//!   once, at the entry point, then handled as `i64` cents
//! - **Oldest debt first**: a payment settles debits in `occurred_at` order,
//!   ties broken by movement id
//! - **Atomic settlement**: a payment and every balance it changes are
//!   committed together or not at all
//! - **Per-account serialization**: concurrent payments for one account never
//!   interleave; different accounts never wait on each other
//!
//! ## Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use settlement_ledger::{
//!     Cents, InMemoryAccountDirectory, InMemoryMovementStore, Ledger, LedgerConfig,
//!     StaticOperationTypeCatalog,
//! };
//!
//! let accounts = InMemoryAccountDirectory::new();
//! let account = accounts.create("12345678900").unwrap();
//! let ledger = Ledger::new(
//!     InMemoryMovementStore::new(),
//!     accounts,
//!     StaticOperationTypeCatalog,
//!     LedgerConfig::default(),
//! );
//!
//! ledger.record_movement(account.id, 1, Decimal::new(10000, 2)).unwrap();
//! ledger.record_movement(account.id, 4, Decimal::new(6000, 2)).unwrap();
//! assert_eq!(ledger.outstanding_debt(account.id).unwrap(), Cents::new(4000));
//! ```

pub mod account;
pub mod allocator;
pub mod batch;
pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod money;
pub mod movement;
pub mod operation;
pub mod store;

pub use account::{Account, AccountDirectory, AccountId, InMemoryAccountDirectory};
pub use allocator::{allocate, BalanceUpdate, OutstandingDebit};
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use ledger::Ledger;
pub use memory::InMemoryMovementStore;
pub use money::Cents;
pub use movement::{Movement, MovementId, NewMovement, RecordedMovement};
pub use operation::{OperationType, OperationTypeCatalog, StaticOperationTypeCatalog};
pub use store::MovementStore;
