//! # Ledger Entities
//!
//! Rows of the four derived ledgers and their composite keys. Entries are
//! created lazily on the first event that references them and are never
//! deleted.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Timestamp, TxHash};

use super::value_objects::EventContext;

// =============================================================================
// KEYS
// =============================================================================

/// Key of an Employee Ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmployeeKey {
    pub organization: Address,
    pub employee: Address,
}

impl EmployeeKey {
    pub fn new(organization: Address, employee: Address) -> Self {
        Self {
            organization,
            employee,
        }
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.organization, self.employee)
    }
}

/// Key of a Joined View entry. Employee first: the view is read from the
/// employee's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JoinedViewKey {
    pub employee: Address,
    pub organization: Address,
}

impl JoinedViewKey {
    pub fn new(employee: Address, organization: Address) -> Self {
        Self {
            employee,
            organization,
        }
    }
}

impl fmt::Display for JoinedViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.employee, self.organization)
    }
}

/// Key of an Auto-Earn entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AutoEarnKey {
    pub organization: Address,
    pub employee: Address,
    pub protocol: Address,
}

impl AutoEarnKey {
    pub fn new(organization: Address, employee: Address, protocol: Address) -> Self {
        Self {
            organization,
            employee,
            protocol,
        }
    }

    pub fn employee_key(&self) -> EmployeeKey {
        EmployeeKey::new(self.organization, self.employee)
    }
}

impl fmt::Display for AutoEarnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.organization, self.employee, self.protocol)
    }
}

// =============================================================================
// EMPLOYEE LEDGER
// =============================================================================

/// Per-(organization, employee) salary and streaming state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeEntry {
    pub organization: Address,
    pub employee: Address,
    pub name: String,
    /// Gross pay per streaming period.
    #[serde(with = "shared_types::amount")]
    pub salary: Amount,
    /// `salary / periodTime`, truncated.
    #[serde(with = "shared_types::amount")]
    pub salary_per_second: Amount,
    /// Enrolled in payroll.
    pub status: bool,
    /// Accrual running.
    pub streaming_active: bool,
    pub salary_stream_start_time: Timestamp,
    #[serde(with = "shared_types::amount")]
    pub current_salary_balance: Amount,
    /// Balance carried across a checkpoint or reported by the contract on
    /// withdrawal. Added on top of newly streamed salary.
    #[serde(with = "shared_types::amount")]
    pub unrealized_salary: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_earned: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_withdrawn: Amount,
    #[serde(with = "shared_types::amount")]
    pub available_balance: Amount,
    /// Amount paid out by the last settlement.
    #[serde(with = "shared_types::amount")]
    pub last_compensation_salary: Amount,
    pub salary_balance_timestamp: Timestamp,
    pub auto_earn_status: bool,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub last_transaction: TxHash,
    pub last_balance_update: Timestamp,
    pub last_status_updated: Timestamp,
    pub last_salary_updated: Timestamp,
}

impl EmployeeEntry {
    /// Fresh entry with every balance at zero, streaming from `ctx.timestamp`.
    pub fn new(key: EmployeeKey, ctx: &EventContext) -> Self {
        Self {
            organization: key.organization,
            employee: key.employee,
            name: String::new(),
            salary: Amount::zero(),
            salary_per_second: Amount::zero(),
            status: true,
            streaming_active: true,
            salary_stream_start_time: ctx.timestamp,
            current_salary_balance: Amount::zero(),
            unrealized_salary: Amount::zero(),
            total_earned: Amount::zero(),
            total_withdrawn: Amount::zero(),
            available_balance: Amount::zero(),
            last_compensation_salary: Amount::zero(),
            salary_balance_timestamp: ctx.timestamp,
            auto_earn_status: false,
            created_at: ctx.timestamp,
            last_updated: ctx.timestamp,
            last_transaction: ctx.tx_hash,
            last_balance_update: ctx.timestamp,
            last_status_updated: 0,
            last_salary_updated: 0,
        }
    }

    pub fn key(&self) -> EmployeeKey {
        EmployeeKey::new(self.organization, self.employee)
    }

    /// Stamp the triggering event.
    pub fn touch(&mut self, ctx: &EventContext) {
        self.last_updated = ctx.timestamp;
        self.last_transaction = ctx.tx_hash;
    }

    /// Salary counted in the organization's `totalSalary`.
    pub fn salary_contribution(&self) -> Amount {
        if self.status {
            self.salary
        } else {
            Amount::zero()
        }
    }

    /// Accruing right now.
    pub fn is_streaming(&self) -> bool {
        self.status && self.streaming_active
    }

    /// Zero the running balance fields.
    pub fn clear_balances(&mut self) {
        self.current_salary_balance = Amount::zero();
        self.available_balance = Amount::zero();
        self.unrealized_salary = Amount::zero();
    }
}

// =============================================================================
// ORGANIZATION LEDGER
// =============================================================================

/// Counter fields of an organization that move by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgCounter {
    TotalEmployees,
    ActiveEmployees,
    CountDeposits,
    CountWithdraws,
}

impl OrgCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalEmployees => "totalEmployees",
            Self::ActiveEmployees => "activeEmployees",
            Self::CountDeposits => "countDeposits",
            Self::CountWithdraws => "countWithdraws",
        }
    }
}

/// Per-organization aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationEntry {
    pub organization: Address,
    pub name: String,
    pub owner: Address,
    pub token: Address,
    /// Seconds in one streaming period.
    pub period_time: u64,
    pub total_employees: u64,
    pub active_employees: u64,
    #[serde(with = "shared_types::amount")]
    pub total_deposits: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_withdrawals: Amount,
    pub count_deposits: u64,
    pub count_withdraws: u64,
    /// Sum of `salary` over active employees, maintained by deltas.
    #[serde(with = "shared_types::amount")]
    pub total_salary: Amount,
    #[serde(with = "shared_types::amount")]
    pub current_balance: Amount,
    #[serde(with = "shared_types::amount")]
    pub shortfall: Amount,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub last_transaction: TxHash,
}

impl OrganizationEntry {
    /// Entry with every aggregate at zero and the given period.
    pub fn new(organization: Address, period_time: u64, ctx: &EventContext) -> Self {
        Self {
            organization,
            name: String::new(),
            owner: Address::ZERO,
            token: Address::ZERO,
            period_time,
            total_employees: 0,
            active_employees: 0,
            total_deposits: Amount::zero(),
            total_withdrawals: Amount::zero(),
            count_deposits: 0,
            count_withdraws: 0,
            total_salary: Amount::zero(),
            current_balance: Amount::zero(),
            shortfall: Amount::zero(),
            created_at: ctx.timestamp,
            last_updated: ctx.timestamp,
            last_transaction: ctx.tx_hash,
        }
    }

    pub fn touch(&mut self, ctx: &EventContext) {
        self.last_updated = ctx.timestamp;
        self.last_transaction = ctx.tx_hash;
    }

    /// Period used for rate computation. Zero falls back to `default`.
    pub fn effective_period(&self, default: u64) -> u64 {
        if self.period_time == 0 {
            default
        } else {
            self.period_time
        }
    }

    pub fn counter(&self, counter: OrgCounter) -> u64 {
        match counter {
            OrgCounter::TotalEmployees => self.total_employees,
            OrgCounter::ActiveEmployees => self.active_employees,
            OrgCounter::CountDeposits => self.count_deposits,
            OrgCounter::CountWithdraws => self.count_withdraws,
        }
    }

    fn counter_mut(&mut self, counter: OrgCounter) -> &mut u64 {
        match counter {
            OrgCounter::TotalEmployees => &mut self.total_employees,
            OrgCounter::ActiveEmployees => &mut self.active_employees,
            OrgCounter::CountDeposits => &mut self.count_deposits,
            OrgCounter::CountWithdraws => &mut self.count_withdraws,
        }
    }

    pub fn increment(&mut self, counter: OrgCounter) {
        let slot = self.counter_mut(counter);
        *slot = slot.saturating_add(1);
    }

    /// Decrement, clamped at zero. Returns `false` if the clamp kicked in.
    pub fn decrement(&mut self, counter: OrgCounter) -> bool {
        let slot = self.counter_mut(counter);
        match slot.checked_sub(1) {
            Some(value) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Recompute `currentBalance` and `shortfall` from the stored totals.
    ///
    /// Returns `true` when withdrawals exceed deposits and the balance was
    /// floored at zero.
    pub fn recalculate(&mut self) -> bool {
        let floored = self.total_withdrawals > self.total_deposits;
        self.current_balance = self.total_deposits.saturating_sub(self.total_withdrawals);
        self.shortfall = self.total_salary.saturating_sub(self.current_balance);
        floored
    }
}

// =============================================================================
// JOINED VIEW
// =============================================================================

/// Employee-scoped copy of an organization's public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedViewEntry {
    pub employee: Address,
    pub organization: Address,
    pub name: String,
    pub owner: Address,
    pub token: Address,
    pub period_time: u64,
    pub total_employees: u64,
    pub active_employees: u64,
    #[serde(with = "shared_types::amount")]
    pub total_deposits: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_withdrawals: Amount,
    pub count_deposits: u64,
    pub count_withdraws: u64,
    #[serde(with = "shared_types::amount")]
    pub total_salary: Amount,
    #[serde(with = "shared_types::amount")]
    pub current_balance: Amount,
    #[serde(with = "shared_types::amount")]
    pub shortfall: Amount,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub last_transaction: TxHash,
}

impl JoinedViewEntry {
    /// Copy `org` into a view row for `employee`. `created_at` survives from
    /// `previous` when the row already exists.
    pub fn replicate(
        employee: Address,
        org: &OrganizationEntry,
        previous: Option<&JoinedViewEntry>,
        ctx: &EventContext,
    ) -> Self {
        Self {
            employee,
            organization: org.organization,
            name: org.name.clone(),
            owner: org.owner,
            token: org.token,
            period_time: org.period_time,
            total_employees: org.total_employees,
            active_employees: org.active_employees,
            total_deposits: org.total_deposits,
            total_withdrawals: org.total_withdrawals,
            count_deposits: org.count_deposits,
            count_withdraws: org.count_withdraws,
            total_salary: org.total_salary,
            current_balance: org.current_balance,
            shortfall: org.shortfall,
            created_at: previous.map_or(ctx.timestamp, |p| p.created_at),
            last_updated: ctx.timestamp,
            last_transaction: ctx.tx_hash,
        }
    }

    pub fn key(&self) -> JoinedViewKey {
        JoinedViewKey::new(self.employee, self.organization)
    }

    /// Whether the replicated fields match `org`.
    pub fn mirrors(&self, org: &OrganizationEntry) -> bool {
        self.organization == org.organization
            && self.name == org.name
            && self.owner == org.owner
            && self.token == org.token
            && self.period_time == org.period_time
            && self.total_employees == org.total_employees
            && self.active_employees == org.active_employees
            && self.total_deposits == org.total_deposits
            && self.total_withdrawals == org.total_withdrawals
            && self.count_deposits == org.count_deposits
            && self.count_withdraws == org.count_withdraws
            && self.total_salary == org.total_salary
            && self.current_balance == org.current_balance
            && self.shortfall == org.shortfall
    }
}

// =============================================================================
// AUTO-EARN
// =============================================================================

/// An employee's opt-in of one protocol into automatic reinvestment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoEarnEntry {
    pub organization: Address,
    pub employee: Address,
    pub protocol: Address,
    #[serde(with = "shared_types::amount")]
    pub auto_earn_amount: Amount,
    pub is_auto_earn: bool,
    #[serde(with = "shared_types::amount")]
    pub total_shares: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_earned: Amount,
    #[serde(with = "shared_types::amount")]
    pub total_withdrawn: Amount,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
    pub last_transaction: TxHash,
    pub enabled_at: Timestamp,
    pub disabled_at: Timestamp,
    pub is_active: bool,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
}

impl AutoEarnEntry {
    pub fn new(key: AutoEarnKey, ctx: &EventContext) -> Self {
        Self {
            organization: key.organization,
            employee: key.employee,
            protocol: key.protocol,
            auto_earn_amount: Amount::zero(),
            is_auto_earn: false,
            total_shares: Amount::zero(),
            total_earned: Amount::zero(),
            total_withdrawn: Amount::zero(),
            created_at: ctx.timestamp,
            last_updated: ctx.timestamp,
            last_transaction: ctx.tx_hash,
            enabled_at: 0,
            disabled_at: 0,
            is_active: false,
            block_number: ctx.block_number,
            block_timestamp: ctx.timestamp,
        }
    }

    pub fn key(&self) -> AutoEarnKey {
        AutoEarnKey::new(self.organization, self.employee, self.protocol)
    }

    pub fn employee_key(&self) -> EmployeeKey {
        EmployeeKey::new(self.organization, self.employee)
    }

    pub fn touch(&mut self, ctx: &EventContext) {
        self.last_updated = ctx.timestamp;
        self.last_transaction = ctx.tx_hash;
        self.block_number = ctx.block_number;
        self.block_timestamp = ctx.timestamp;
    }
}
