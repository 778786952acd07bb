//! Settlement scenarios through the public ledger API.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use settlement_ledger::memory::Clock;
use settlement_ledger::{
    AccountDirectory, AccountId, BalanceUpdate, Cents, ErrorKind, InMemoryAccountDirectory,
    InMemoryMovementStore, Ledger, LedgerConfig, LedgerError, Movement, MovementId,
    MovementStore, NewMovement, OperationTypeCatalog, OutstandingDebit, Result,
    StaticOperationTypeCatalog,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const PURCHASE: i64 = 1;
const INSTALLMENT: i64 = 2;
const WITHDRAWAL: i64 = 3;
const PAYMENT: i64 = 4;

type MemoryLedger =
    Ledger<InMemoryMovementStore, InMemoryAccountDirectory, StaticOperationTypeCatalog>;

fn stepping_clock() -> Clock {
    let tick = Arc::new(AtomicI64::new(0));
    Box::new(move || {
        let n = tick.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
    })
}

fn setup() -> (MemoryLedger, AccountId) {
    let accounts = InMemoryAccountDirectory::new();
    let account = accounts.create("12345678900").unwrap();
    let ledger = Ledger::new(
        InMemoryMovementStore::with_clock(stepping_clock()),
        accounts,
        StaticOperationTypeCatalog,
        LedgerConfig::default(),
    );
    (ledger, account.id)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn record(ledger: &MemoryLedger, account: AccountId, op: i64, amount: &str) -> MovementId {
    ledger.record_movement(account, op, dec(amount)).unwrap().id
}

fn unsettled(ledger: &MemoryLedger, id: MovementId) -> i64 {
    ledger
        .store()
        .get(id)
        .unwrap()
        .unwrap()
        .unsettled_balance
        .minor()
}

fn three_debits(ledger: &MemoryLedger, account: AccountId) -> [MovementId; 3] {
    [
        record(ledger, account, PURCHASE, "100.00"),
        record(ledger, account, INSTALLMENT, "150.00"),
        record(ledger, account, WITHDRAWAL, "50.00"),
    ]
}

// ==================== SCENARIOS ====================

#[test]
fn test_scenario_a_exact_payment_settles_debit() {
    let (ledger, account) = setup();
    let debit = record(&ledger, account, PURCHASE, "100.00");
    assert_eq!(unsettled(&ledger, debit), -10000);

    record(&ledger, account, PAYMENT, "100.00");

    assert_eq!(unsettled(&ledger, debit), 0);
    assert_eq!(ledger.outstanding_debt(account).unwrap(), Cents::ZERO);
}

#[test]
fn test_scenario_b_partial_payment() {
    let (ledger, account) = setup();
    let debit = record(&ledger, account, PURCHASE, "100.00");

    record(&ledger, account, PAYMENT, "50.00");

    assert_eq!(unsettled(&ledger, debit), -5000);
}

#[test]
fn test_scenario_c_payment_covers_all_debits() {
    let (ledger, account) = setup();
    let ids = three_debits(&ledger, account);

    record(&ledger, account, PAYMENT, "300.00");

    for id in ids {
        assert_eq!(unsettled(&ledger, id), 0);
    }
}

#[test]
fn test_scenario_d_payment_splits_into_second_debit() {
    let (ledger, account) = setup();
    let [first, second, third] = three_debits(&ledger, account);

    record(&ledger, account, PAYMENT, "180.00");

    assert_eq!(unsettled(&ledger, first), 0);
    assert_eq!(unsettled(&ledger, second), -7000);
    assert_eq!(unsettled(&ledger, third), -5000);
}

#[test]
fn test_scenario_e_small_payment_into_second_debit() {
    let (ledger, account) = setup();
    let [first, second, third] = three_debits(&ledger, account);

    record(&ledger, account, PAYMENT, "120.00");

    assert_eq!(unsettled(&ledger, first), 0);
    assert_eq!(unsettled(&ledger, second), -13000);
    assert_eq!(unsettled(&ledger, third), -5000);
}

#[test]
fn test_scenario_f_payment_without_debits_is_still_recorded() {
    let (ledger, account) = setup();

    let recorded = ledger
        .record_movement(account, PAYMENT, dec("75.00"))
        .unwrap();

    let stored = ledger.store().get(recorded.id).unwrap().unwrap();
    assert_eq!(stored.amount, Cents::new(7500));
    assert_eq!(recorded.amount, Cents::new(7500));
    assert_eq!(ledger.movements(account).unwrap().len(), 1);
}

#[test]
fn test_earlier_payment_does_not_settle_later_debits() {
    let (ledger, account) = setup();
    record(&ledger, account, PAYMENT, "75.00");
    let debit = record(&ledger, account, PURCHASE, "20.00");

    assert_eq!(unsettled(&ledger, debit), -2000);
    assert_eq!(ledger.outstanding_debt(account).unwrap(), Cents::new(2000));
}

#[test]
fn test_successive_payments_continue_where_previous_stopped() {
    let (ledger, account) = setup();
    let [first, second, third] = three_debits(&ledger, account);

    record(&ledger, account, PAYMENT, "120.00");
    record(&ledger, account, PAYMENT, "130.00");
    assert_eq!(unsettled(&ledger, first), 0);
    assert_eq!(unsettled(&ledger, second), 0);
    assert_eq!(unsettled(&ledger, third), -5000);

    record(&ledger, account, PAYMENT, "10.00");
    assert_eq!(unsettled(&ledger, third), -4000);
    assert_eq!(ledger.outstanding_debt(account).unwrap(), Cents::new(4000));
}

#[test]
fn test_payments_only_touch_their_own_account() {
    let (ledger, account) = setup();
    let other = ledger.accounts().create("98765432100").unwrap().id;

    let mine = record(&ledger, account, PURCHASE, "10.00");
    let theirs = record(&ledger, other, PURCHASE, "10.00");

    record(&ledger, other, PAYMENT, "10.00");

    assert_eq!(unsettled(&ledger, mine), -1000);
    assert_eq!(unsettled(&ledger, theirs), 0);
}

#[test]
fn test_amounts_are_never_mutated() {
    let (ledger, account) = setup();
    let ids = three_debits(&ledger, account);
    record(&ledger, account, PAYMENT, "180.00");

    let amounts: Vec<i64> = ids
        .iter()
        .map(|id| ledger.store().get(*id).unwrap().unwrap().amount.minor())
        .collect();
    assert_eq!(amounts, vec![-10000, -15000, -5000]);
}

#[test]
fn test_outstanding_debt_matches_history() {
    let (ledger, account) = setup();
    let script = [
        (PURCHASE, "12.34"),
        (PAYMENT, "5.00"),
        (WITHDRAWAL, "100.00"),
        (INSTALLMENT, "0.66"),
        (PAYMENT, "50.00"),
        (PURCHASE, "3.00"),
        (PAYMENT, "1000.00"),
        (PURCHASE, "7.77"),
    ];

    for (op, amount) in script {
        record(&ledger, account, op, amount);
    }

    // The 1000.00 payment clears the 61.00 still owed; only the last purchase remains
    assert_eq!(ledger.outstanding_debt(account).unwrap(), Cents::new(777));

    for movement in ledger.movements(account).unwrap() {
        assert!(!movement.unsettled_balance.is_positive());
        assert!(movement.unsettled_balance >= movement.amount.min(Cents::ZERO));
    }
}

// ==================== FAILURE HANDLING ====================

/// Store wrapper that fails every commit carrying balance updates.
struct FailingSettlementStore {
    inner: InMemoryMovementStore,
}

impl MovementStore for FailingSettlementStore {
    fn find_unsettled_debits(&self, account_id: AccountId) -> Result<Vec<OutstandingDebit>> {
        self.inner.find_unsettled_debits(account_id)
    }

    fn commit(&self, movement: NewMovement, updates: &[BalanceUpdate]) -> Result<Movement> {
        if let Some(update) = updates.first() {
            return Err(LedgerError::AllocationFailure {
                movement_id: update.movement_id,
                message: "disk full".to_string(),
            });
        }
        self.inner.commit(movement, updates)
    }

    fn movements_for_account(&self, account_id: AccountId) -> Result<Vec<Movement>> {
        self.inner.movements_for_account(account_id)
    }
}

#[test]
fn test_failed_settlement_leaves_no_trace() {
    let accounts = InMemoryAccountDirectory::new();
    let account = accounts.create("1").unwrap().id;
    let ledger = Ledger::new(
        FailingSettlementStore {
            inner: InMemoryMovementStore::new(),
        },
        accounts,
        StaticOperationTypeCatalog,
        LedgerConfig::default(),
    );

    ledger.record_movement(account, PURCHASE, dec("40")).unwrap();
    let before = ledger.movements(account).unwrap();

    let err = ledger
        .record_movement(account, PAYMENT, dec("40"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::AllocationFailure { .. }));
    assert!(!err.is_retryable());

    assert_eq!(ledger.movements(account).unwrap(), before);
    assert_eq!(ledger.outstanding_debt(account).unwrap(), Cents::new(4000));
}

/// Collaborator that is unreachable.
struct BrokenCollaborator;

impl AccountDirectory for BrokenCollaborator {
    fn exists(&self, _account_id: AccountId) -> Result<bool> {
        Err(LedgerError::Persistence("connection refused".to_string()))
    }
}

impl OperationTypeCatalog for BrokenCollaborator {
    fn exists(&self, _operation_type_id: i64) -> Result<bool> {
        Err(LedgerError::Persistence("connection refused".to_string()))
    }
}

#[test]
fn test_account_lookup_failure_is_not_reported_as_missing() {
    let ledger = Ledger::new(
        InMemoryMovementStore::new(),
        BrokenCollaborator,
        StaticOperationTypeCatalog,
        LedgerConfig::default(),
    );

    let err = ledger.record_movement(1, PURCHASE, dec("10")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(err.to_string().contains("connection refused"));
    assert!(ledger.store().is_empty().unwrap());
}

#[test]
fn test_operation_type_lookup_failure_is_not_reported_as_invalid() {
    let accounts = InMemoryAccountDirectory::new();
    let account = accounts.create("1").unwrap().id;
    let ledger = Ledger::new(
        InMemoryMovementStore::new(),
        accounts,
        BrokenCollaborator,
        LedgerConfig::default(),
    );

    let err = ledger
        .record_movement(account, PAYMENT, dec("10"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(ledger.store().is_empty().unwrap());
}

/// Catalog that vouches for ids outside the fixed enumeration.
struct PermissiveCatalog;

impl OperationTypeCatalog for PermissiveCatalog {
    fn exists(&self, _operation_type_id: i64) -> Result<bool> {
        Ok(true)
    }
}

#[test]
fn test_catalog_cannot_admit_unknown_operation_type() {
    let accounts = InMemoryAccountDirectory::new();
    let account = accounts.create("1").unwrap().id;
    let ledger = Ledger::new(
        InMemoryMovementStore::new(),
        accounts,
        PermissiveCatalog,
        LedgerConfig::default(),
    );

    let err = ledger.record_movement(account, 7, dec("10")).unwrap_err();
    assert!(matches!(err, LedgerError::OperationTypeInvalid(7)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
