//! # Dispatch Failure Tests
//!
//! A fatal error must leave the ledgers exactly as they were before the
//! event. These tests inject failures into the store and the event log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use payroll_ledger::{
    AutoEarnEntry, AutoEarnKey, DepositPayload, DomainEvent, EmployeeEntry, EmployeeKey,
    EmployeeSalaryAddedPayload, EventDispatcher, EventEnvelope, InMemoryEventLog,
    InMemoryLedgerStore, JoinedViewEntry, JoinedViewKey, LedgerConfig, LedgerError, LedgerStore,
    Metrics, OrganizationCreatedPayload, OrganizationEntry, RawEventLog, RawEventRecord,
    WriteBatch,
};
use shared_types::{Address, Amount, TxHash};

const FACTORY: Address = Address::repeat_byte(0xfa);
const ORG: Address = Address::repeat_byte(0x0a);
const ALICE: Address = Address::repeat_byte(0xa1);

/// Delegates to an in-memory store; membership reads fail on demand.
struct FlakyStore {
    inner: InMemoryLedgerStore,
    fail_members: AtomicBool,
    fail_commit: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            fail_members: AtomicBool::new(false),
            fail_commit: AtomicBool::new(false),
        }
    }
}

impl LedgerStore for FlakyStore {
    fn employee(&self, key: &EmployeeKey) -> Result<Option<EmployeeEntry>, LedgerError> {
        self.inner.employee(key)
    }

    fn organization(
        &self,
        organization: &Address,
    ) -> Result<Option<OrganizationEntry>, LedgerError> {
        self.inner.organization(organization)
    }

    fn joined_view(&self, key: &JoinedViewKey) -> Result<Option<JoinedViewEntry>, LedgerError> {
        self.inner.joined_view(key)
    }

    fn auto_earn(&self, key: &AutoEarnKey) -> Result<Option<AutoEarnEntry>, LedgerError> {
        self.inner.auto_earn(key)
    }

    fn auto_earn_of(&self, employee: &EmployeeKey) -> Result<Vec<AutoEarnEntry>, LedgerError> {
        self.inner.auto_earn_of(employee)
    }

    fn members(&self, organization: &Address) -> Result<Vec<Address>, LedgerError> {
        if self.fail_members.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("membership index offline".into()));
        }
        self.inner.members(organization)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), LedgerError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("write rejected".into()));
        }
        self.inner.commit(batch)
    }
}

struct RejectingLog;

impl RawEventLog for RejectingLog {
    fn append(&self, _record: RawEventRecord) -> Result<(), LedgerError> {
        Err(LedgerError::EventLog("disk full".into()))
    }
}

fn envelope(ts: u64, emitter: Address, event: DomainEvent) -> EventEnvelope {
    EventEnvelope::new(emitter, ts, ts, TxHash::repeat_byte(ts as u8), event)
}

fn org_created() -> EventEnvelope {
    envelope(
        0,
        FACTORY,
        DomainEvent::OrganizationCreated(OrganizationCreatedPayload {
            owner: Address::repeat_byte(1),
            organization: ORG,
            name: "Acme".into(),
            token: Address::repeat_byte(2),
        }),
    )
}

fn salary_added(ts: u64) -> EventEnvelope {
    envelope(
        ts,
        ORG,
        DomainEvent::EmployeeSalaryAdded(EmployeeSalaryAddedPayload {
            employee: ALICE,
            name: "Alice".into(),
            salary: Amount::from(2_592_000u64),
            start_stream: 0,
            timestamp: ts,
            is_auto_earn: false,
        }),
    )
}

fn deposit(ts: u64, amount: u64) -> EventEnvelope {
    envelope(
        ts,
        ORG,
        DomainEvent::Deposit(DepositPayload {
            owner: Address::repeat_byte(1),
            amount: Amount::from(amount),
        }),
    )
}

#[test]
fn test_failed_fan_out_discards_staged_totals() {
    let store = Arc::new(FlakyStore::new());
    let metrics = Arc::new(Metrics::new());
    let dispatcher = EventDispatcher::new(
        store.clone(),
        Arc::new(InMemoryEventLog::new()),
        LedgerConfig::default(),
    )
    .with_metrics(metrics.clone());

    dispatcher.dispatch(&org_created()).unwrap();
    dispatcher.dispatch(&salary_added(0)).unwrap();
    let before = store.organization(&ORG).unwrap().unwrap();

    // Totals are staged before the fan-out reads the membership index.
    store.fail_members.store(true, Ordering::SeqCst);
    let err = dispatcher.dispatch(&deposit(10, 500)).unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));
    assert!(err.is_fatal());

    let after = store.organization(&ORG).unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.total_deposits, Amount::zero());
    assert_eq!(after.count_deposits, 0);
    assert_eq!(metrics.snapshot().events_failed, 1);

    // The same event applies cleanly once the store recovers.
    store.fail_members.store(false, Ordering::SeqCst);
    dispatcher.dispatch(&deposit(10, 500)).unwrap();
    assert_eq!(
        store.organization(&ORG).unwrap().unwrap().total_deposits,
        Amount::from(500u64)
    );
}

#[test]
fn test_rejected_commit_leaves_store_untouched() {
    let store = Arc::new(FlakyStore::new());
    let log = Arc::new(InMemoryEventLog::new());
    let dispatcher = EventDispatcher::new(store.clone(), log.clone(), LedgerConfig::default());
    dispatcher.dispatch(&org_created()).unwrap();

    store.fail_commit.store(true, Ordering::SeqCst);
    assert!(dispatcher.dispatch(&salary_added(5)).is_err());

    assert!(store
        .employee(&EmployeeKey::new(ORG, ALICE))
        .unwrap()
        .is_none());
    assert!(store.members(&ORG).unwrap().is_empty());
    assert_eq!(store.organization(&ORG).unwrap().unwrap().total_employees, 0);
    // The raw record was appended before the handler ran.
    assert_eq!(log.len(), 2);
    // A failed event does not advance the ordering guard.
    assert_eq!(dispatcher.last_timestamp(), Some(0));
}

#[test]
fn test_event_log_failure_is_fatal() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let dispatcher = EventDispatcher::new(store.clone(), Arc::new(RejectingLog), LedgerConfig::default());

    let err = dispatcher.dispatch(&org_created()).unwrap_err();
    assert!(matches!(err, LedgerError::EventLog(_)));
    assert!(store.organization(&ORG).unwrap().is_none());
    assert_eq!(dispatcher.last_timestamp(), None);
}

#[test]
fn test_overflowing_deposit_is_rejected() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let dispatcher = EventDispatcher::new(
        store.clone(),
        Arc::new(InMemoryEventLog::new()),
        LedgerConfig::default(),
    );
    dispatcher.dispatch(&org_created()).unwrap();

    let huge = envelope(
        1,
        ORG,
        DomainEvent::Deposit(DepositPayload {
            owner: Address::repeat_byte(1),
            amount: Amount::max_value(),
        }),
    );
    dispatcher.dispatch(&huge).unwrap();
    let err = dispatcher.dispatch(&deposit(2, 1)).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ArithmeticOverflow {
            field: "totalDeposits"
        }
    ));
    let org = store.organization(&ORG).unwrap().unwrap();
    assert_eq!(org.total_deposits, Amount::max_value());
    assert_eq!(org.count_deposits, 1);
}
