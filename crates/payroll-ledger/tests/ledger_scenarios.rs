//! # Ledger Scenario Tests
//!
//! End-to-end feeds through the dispatcher. After every feed the whole store
//! is checked against the ledger invariants.
//!
//! ## Test Categories
//!
//! 1. **Streaming** - accrual, withdrawal, projection
//! 2. **Status and salary** - settlement on disable, rate changes
//! 3. **Period changes** - checkpoint at the old rate, re-base
//! 4. **Organization funds** - deposits, withdrawals, shortfall
//! 5. **Auto-Earn** - enable, earn, disable

use std::sync::Arc;

use payroll_ledger::{
    check_employee, check_joined_view, check_organization, check_total_salary, AutoEarnKey,
    DepositPayload, DisableAutoEarnPayload, DomainEvent, EarnSalaryPayload,
    EmployeeSalaryAddedPayload, EmployeeSalarySetPayload, EmployeeStatusChangedPayload,
    EnableAutoEarnPayload, EventDispatcher, EventEnvelope, EventKind, InMemoryEventLog,
    InMemoryLedgerStore, JoinedViewKey, LedgerConfig, LedgerQueryApi, LedgerQueryService,
    LedgerStore, Metrics, OrganizationCreatedPayload, PeriodTimeSetPayload, SetEmployeeNamePayload,
    SetNamePayload, WithdrawAllPayload, WithdrawBalanceOrganizationPayload, WithdrawPayload,
};
use shared_types::{Address, Amount, TxHash};

// =============================================================================
// TEST HELPERS
// =============================================================================

const FACTORY: Address = Address::repeat_byte(0xfa);
const ORG: Address = Address::repeat_byte(0x0a);
const OWNER: Address = Address::repeat_byte(0x01);
const TOKEN: Address = Address::repeat_byte(0x02);
const ALICE: Address = Address::repeat_byte(0xa1);
const BOB: Address = Address::repeat_byte(0xb0);
const PROTOCOL: Address = Address::repeat_byte(0x99);

/// Salary that streams exactly one unit per second over the default period.
const ONE_PER_SECOND: u64 = 2_592_000;

fn amount(value: u64) -> Amount {
    Amount::from(value)
}

struct Feed {
    store: Arc<InMemoryLedgerStore>,
    log: Arc<InMemoryEventLog>,
    metrics: Arc<Metrics>,
    dispatcher: EventDispatcher,
    query: LedgerQueryService,
    next_tx: u64,
}

impl Feed {
    fn new() -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let log = Arc::new(InMemoryEventLog::new());
        let metrics = Arc::new(Metrics::new());
        let dispatcher = EventDispatcher::new(store.clone(), log.clone(), LedgerConfig::default())
            .with_metrics(metrics.clone());
        let query = LedgerQueryService::new(store.clone(), LedgerConfig::default());
        Self {
            store,
            log,
            metrics,
            dispatcher,
            query,
            next_tx: 0,
        }
    }

    fn emit_from(&mut self, ts: u64, emitter: Address, event: DomainEvent) {
        self.next_tx += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&self.next_tx.to_be_bytes());
        let envelope = EventEnvelope::new(emitter, ts, ts, TxHash(hash), event);
        self.dispatcher.dispatch(&envelope).unwrap();
    }

    fn emit(&mut self, ts: u64, event: DomainEvent) {
        self.emit_from(ts, ORG, event);
    }

    fn create_org(&mut self, ts: u64) {
        self.emit_from(
            ts,
            FACTORY,
            DomainEvent::OrganizationCreated(OrganizationCreatedPayload {
                owner: OWNER,
                organization: ORG,
                name: "Acme".into(),
                token: TOKEN,
            }),
        );
    }

    fn add_employee(&mut self, ts: u64, employee: Address, salary: u64) {
        self.emit(
            ts,
            DomainEvent::EmployeeSalaryAdded(EmployeeSalaryAddedPayload {
                employee,
                name: String::new(),
                salary: amount(salary),
                start_stream: 0,
                timestamp: ts,
                is_auto_earn: false,
            }),
        );
    }

    fn set_status(&mut self, ts: u64, employee: Address, status: bool) {
        self.emit(
            ts,
            DomainEvent::EmployeeStatusChanged(EmployeeStatusChangedPayload { employee, status }),
        );
    }

    fn deposit(&mut self, ts: u64, value: u64) {
        self.emit(
            ts,
            DomainEvent::Deposit(DepositPayload {
                owner: OWNER,
                amount: amount(value),
            }),
        );
    }

    fn employee(&self, employee: Address) -> payroll_ledger::EmployeeEntry {
        self.query.employee(ORG, employee).unwrap().unwrap()
    }

    fn org(&self) -> payroll_ledger::OrganizationEntry {
        self.query.organization(ORG).unwrap().unwrap()
    }

    /// Every ledger invariant over the whole store.
    fn assert_invariants(&self) {
        let employees = self.store.all_employees().unwrap();
        for employee in &employees {
            check_employee(employee).unwrap();
        }
        for org in self.store.all_organizations().unwrap() {
            check_organization(&org).unwrap();
            check_total_salary(&org, &employees).unwrap();
        }
        for view in self.store.all_joined_views().unwrap() {
            let org = self.store.organization(&view.organization).unwrap().unwrap();
            check_joined_view(&view, &org).unwrap();
        }
    }
}

// =============================================================================
// STREAMING
// =============================================================================

#[test]
fn test_withdraw_then_projection() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);

    feed.emit(
        100,
        DomainEvent::Withdraw(WithdrawPayload {
            employee: ALICE,
            amount: amount(60),
            unrealized_salary: Amount::zero(),
            is_offramp: false,
            start_stream: 0,
        }),
    );

    let alice = feed.employee(ALICE);
    assert_eq!(alice.current_salary_balance, amount(100));
    assert_eq!(alice.available_balance, amount(40));
    assert_eq!(alice.total_withdrawn, amount(60));
    assert_eq!(alice.salary_stream_start_time, 100);

    let projected = feed.query.projected_balance(ORG, ALICE, 200).unwrap();
    assert_eq!(projected.current_balance, amount(100));

    let org = feed.org();
    assert_eq!(org.total_withdrawals, amount(60));
    assert_eq!(org.count_withdraws, 1);
    assert_eq!(org.current_balance, Amount::zero());
    assert_eq!(org.shortfall, amount(ONE_PER_SECOND));
    assert!(feed.metrics.snapshot().balance_floors >= 1);
    feed.assert_invariants();
}

#[test]
fn test_withdraw_all_zeroes_balances() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    feed.deposit(0, 1_000);

    feed.emit(
        50,
        DomainEvent::WithdrawAll(WithdrawAllPayload {
            employee: ALICE,
            amount: amount(50),
            is_offramp: true,
            start_stream: 60,
        }),
    );

    let alice = feed.employee(ALICE);
    assert_eq!(alice.current_salary_balance, Amount::zero());
    assert_eq!(alice.available_balance, Amount::zero());
    assert_eq!(alice.unrealized_salary, Amount::zero());
    assert_eq!(alice.total_withdrawn, amount(50));
    assert_eq!(alice.total_earned, amount(50));
    assert_eq!(alice.salary_stream_start_time, 60);

    let org = feed.org();
    assert_eq!(org.current_balance, amount(950));
    assert_eq!(org.count_withdraws, 1);
    feed.assert_invariants();
}

#[test]
fn test_checkpoint_twice_at_same_timestamp() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);

    feed.emit(
        70,
        DomainEvent::SetEmployeeName(SetEmployeeNamePayload {
            employee: ALICE,
            name: "Alice".into(),
        }),
    );
    let first = feed.employee(ALICE);
    feed.emit(
        70,
        DomainEvent::SetEmployeeName(SetEmployeeNamePayload {
            employee: ALICE,
            name: "Alice".into(),
        }),
    );
    let second = feed.employee(ALICE);

    assert_eq!(first.current_salary_balance, amount(70));
    assert_eq!(second.current_salary_balance, first.current_salary_balance);
    assert_eq!(second.total_earned, first.total_earned);
    assert_eq!(second.salary_stream_start_time, 70);
}

// =============================================================================
// STATUS AND SALARY
// =============================================================================

#[test]
fn test_disable_pays_out_accrued_salary() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    feed.set_status(300, ALICE, false);

    let alice = feed.employee(ALICE);
    assert!(!alice.status);
    assert_eq!(alice.total_withdrawn, amount(300));
    assert_eq!(alice.last_compensation_salary, amount(300));
    assert_eq!(alice.current_salary_balance, Amount::zero());

    let org = feed.org();
    assert_eq!(org.active_employees, 0);
    assert_eq!(org.total_employees, 1);
    assert_eq!(org.total_salary, Amount::zero());
    assert_eq!(org.total_withdrawals, amount(300));

    // Re-enabling in the same block pays nothing more.
    feed.set_status(300, ALICE, true);
    let alice = feed.employee(ALICE);
    assert_eq!(alice.total_withdrawn, amount(300));
    assert_eq!(alice.salary_stream_start_time, 300);
    assert_eq!(feed.org().total_salary, amount(ONE_PER_SECOND));

    let projected = feed.query.projected_balance(ORG, ALICE, 400).unwrap();
    assert_eq!(projected.current_balance, amount(100));
    feed.assert_invariants();
}

#[test]
fn test_degraded_disable_does_not_repay_withdrawn_balance() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.emit(
        0,
        DomainEvent::EmployeeSalaryAdded(EmployeeSalaryAddedPayload {
            employee: ALICE,
            name: String::new(),
            salary: Amount::max_value(),
            start_stream: 0,
            timestamp: 0,
            is_auto_earn: false,
        }),
    );
    feed.emit(
        100,
        DomainEvent::Withdraw(WithdrawPayload {
            employee: ALICE,
            amount: amount(60),
            unrealized_salary: Amount::zero(),
            is_offramp: false,
            start_stream: 0,
        }),
    );
    let before = feed.employee(ALICE);
    assert!(!before.current_salary_balance.is_zero());
    assert_eq!(before.unrealized_salary, Amount::zero());

    // Three periods at the maximum rate overflow the accrual.
    feed.set_status(100 + 3 * ONE_PER_SECOND, ALICE, false);
    assert_eq!(feed.metrics.snapshot().degraded_accruals, 1);

    let alice = feed.employee(ALICE);
    assert!(!alice.status);
    assert_eq!(alice.total_withdrawn, amount(60));
    assert_eq!(alice.last_compensation_salary, Amount::zero());
    assert_eq!(alice.current_salary_balance, Amount::zero());
    assert_eq!(feed.org().total_withdrawals, amount(60));
}

#[test]
fn test_salary_changes_conserve_accrual() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);

    feed.emit(
        100,
        DomainEvent::EmployeeSalarySet(EmployeeSalarySetPayload {
            employee: ALICE,
            salary: amount(2 * ONE_PER_SECOND),
            start_stream: 0,
        }),
    );
    // Another salary change without settlement.
    feed.add_employee(150, ALICE, 3 * ONE_PER_SECOND);
    feed.emit(
        200,
        DomainEvent::SetEmployeeName(SetEmployeeNamePayload {
            employee: ALICE,
            name: "Alice".into(),
        }),
    );

    // 1/s for 100s, 2/s for 50s, 3/s for 50s.
    let alice = feed.employee(ALICE);
    assert_eq!(alice.total_earned, amount(100 + 100 + 150));
    assert_eq!(alice.total_withdrawn, amount(100));
    assert_eq!(alice.current_salary_balance, amount(250));

    let org = feed.org();
    assert_eq!(org.total_employees, 1);
    assert_eq!(org.total_salary, amount(3 * ONE_PER_SECOND));
    feed.assert_invariants();
}

#[test]
fn test_total_salary_tracks_active_employees() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    feed.add_employee(0, BOB, 2 * ONE_PER_SECOND);
    assert_eq!(feed.org().total_salary, amount(3 * ONE_PER_SECOND));
    assert_eq!(feed.org().active_employees, 2);

    feed.set_status(10, BOB, false);
    assert_eq!(feed.org().total_salary, amount(ONE_PER_SECOND));

    // Salary change while inactive stays out of the total.
    feed.emit(
        20,
        DomainEvent::EmployeeSalarySet(EmployeeSalarySetPayload {
            employee: BOB,
            salary: amount(5 * ONE_PER_SECOND),
            start_stream: 0,
        }),
    );
    assert_eq!(feed.org().total_salary, amount(ONE_PER_SECOND));

    feed.set_status(30, BOB, true);
    assert_eq!(feed.org().total_salary, amount(6 * ONE_PER_SECOND));
    assert_eq!(feed.org().active_employees, 2);
    feed.assert_invariants();
}

// =============================================================================
// PERIOD CHANGES
// =============================================================================

#[test]
fn test_period_change_rebases_streaming_employees() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    feed.add_employee(0, BOB, ONE_PER_SECOND);
    feed.set_status(0, BOB, false);

    feed.emit(
        1_000,
        DomainEvent::PeriodTimeSet(PeriodTimeSetPayload {
            period_time: 86_400,
        }),
    );

    let alice = feed.employee(ALICE);
    assert_eq!(alice.total_withdrawn, amount(1_000));
    assert_eq!(alice.total_earned, amount(1_000));
    assert_eq!(alice.current_salary_balance, Amount::zero());
    assert_eq!(alice.salary_per_second, amount(30));
    assert_eq!(alice.salary_stream_start_time, 1_000);

    let bob = feed.employee(BOB);
    assert_eq!(bob.total_withdrawn, Amount::zero());
    assert_eq!(bob.salary_per_second, amount(30));

    let org = feed.org();
    assert_eq!(org.period_time, 86_400);
    assert_eq!(org.total_withdrawals, amount(1_000));

    let projected = feed.query.projected_balance(ORG, ALICE, 1_010).unwrap();
    assert_eq!(projected.current_balance, amount(300));

    for member in [ALICE, BOB] {
        let view = feed.query.joined_view(member, ORG).unwrap().unwrap();
        assert_eq!(view.period_time, 86_400);
    }
    feed.assert_invariants();
}

// =============================================================================
// ORGANIZATION FUNDS
// =============================================================================

#[test]
fn test_deposit_reduces_shortfall() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    assert_eq!(feed.org().shortfall, amount(ONE_PER_SECOND));

    feed.deposit(10, 1_000_000);
    let org = feed.org();
    assert_eq!(org.current_balance, amount(1_000_000));
    assert_eq!(org.shortfall, amount(ONE_PER_SECOND - 1_000_000));
    assert_eq!(org.count_deposits, 1);

    feed.emit(
        20,
        DomainEvent::WithdrawBalanceOrganization(WithdrawBalanceOrganizationPayload {
            amount: amount(400_000),
            is_offramp: false,
        }),
    );
    let org = feed.org();
    assert_eq!(org.current_balance, amount(600_000));
    assert_eq!(org.shortfall, amount(ONE_PER_SECOND - 600_000));
    assert_eq!(org.count_withdraws, 1);

    let view = feed.query.joined_view(ALICE, ORG).unwrap().unwrap();
    assert!(view.mirrors(&org));
    feed.assert_invariants();
}

#[test]
fn test_rename_fans_out_to_members() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    feed.add_employee(0, BOB, ONE_PER_SECOND);
    feed.emit(
        5,
        DomainEvent::SetName(SetNamePayload {
            name: "Acme Labs".into(),
        }),
    );

    for member in [ALICE, BOB] {
        let view = feed
            .store
            .joined_view(&JoinedViewKey::new(member, ORG))
            .unwrap()
            .unwrap();
        assert_eq!(view.name, "Acme Labs");
        assert_eq!(view.owner, OWNER);
        assert_eq!(view.token, TOKEN);
    }
    assert_eq!(feed.log.len(), 4);
    assert_eq!(feed.metrics.processed(EventKind::SetName), 1);
}

// =============================================================================
// AUTO-EARN
// =============================================================================

#[test]
fn test_auto_earn_lifecycle() {
    let mut feed = Feed::new();
    feed.create_org(0);
    feed.add_employee(0, ALICE, ONE_PER_SECOND);
    let other_protocol = Address::repeat_byte(0x98);

    for protocol in [PROTOCOL, other_protocol] {
        feed.emit(
            10,
            DomainEvent::EnableAutoEarn(EnableAutoEarnPayload {
                employee: ALICE,
                protocol,
                amount: amount(25),
            }),
        );
    }
    assert!(feed.employee(ALICE).auto_earn_status);

    feed.emit(
        40,
        DomainEvent::EarnSalary(EarnSalaryPayload {
            employee: ALICE,
            protocol: PROTOCOL,
            amount: amount(25),
            shares: amount(24),
        }),
    );
    let alice = feed.employee(ALICE);
    assert_eq!(alice.current_salary_balance, amount(15));
    assert_eq!(alice.total_withdrawn, amount(25));

    feed.emit(
        50,
        DomainEvent::DisableAutoEarn(DisableAutoEarnPayload {
            employee: ALICE,
            protocol: PROTOCOL,
        }),
    );
    // Still enabled for the other protocol.
    assert!(feed.employee(ALICE).auto_earn_status);

    feed.emit(
        60,
        DomainEvent::DisableAutoEarn(DisableAutoEarnPayload {
            employee: ALICE,
            protocol: other_protocol,
        }),
    );
    assert!(!feed.employee(ALICE).auto_earn_status);

    let entry = feed
        .store
        .auto_earn(&AutoEarnKey::new(ORG, ALICE, PROTOCOL))
        .unwrap()
        .unwrap();
    assert!(!entry.is_active);
    assert!(!entry.is_auto_earn);
    assert_eq!(entry.enabled_at, 10);
    assert_eq!(entry.disabled_at, 50);
    assert_eq!(entry.total_shares, amount(24));
    assert_eq!(entry.total_earned, amount(25));
    assert_eq!(entry.auto_earn_amount, amount(25));
    feed.assert_invariants();
}

#[test]
fn test_employee_events_for_unknown_org_keep_membership() {
    let mut feed = Feed::new();
    feed.add_employee(0, ALICE, ONE_PER_SECOND);

    assert!(feed.query.organization(ORG).unwrap().is_none());
    assert_eq!(feed.store.members(&ORG).unwrap(), vec![ALICE]);
    assert_eq!(feed.employee(ALICE).salary_per_second, Amount::one());
    assert_eq!(feed.query.employees_of(ORG).unwrap().len(), 1);

    // Unknown organization: nothing streams.
    let projected = feed.query.projected_balance(ORG, ALICE, 100).unwrap();
    assert!(!projected.active);
}
