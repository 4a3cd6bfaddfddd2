//! # Streaming Balance Calculator
//!
//! Pure projection of how much salary an employee has accrued since the
//! last checkpoint. Nothing here touches storage.
//!
//! ```text
//! salaryPerSecond  = salary / periodTime          (integer division)
//! timeElapsed      = max(0, at - streamStart)
//! streamed         = salaryPerSecond * timeElapsed
//! currentBalance   = streamed + unrealizedSalary
//! totalEarned      = streamed + previous totalEarned
//! ```
//!
//! The remainder of `salary / periodTime` is dropped each time the rate is
//! recomputed and never carried forward.

use shared_types::{Amount, Timestamp};

use super::entities::{EmployeeEntry, OrganizationEntry};
use super::errors::LedgerError;

/// Default streaming period: 30 days.
pub const DEFAULT_PERIOD_SECS: u64 = 2_592_000;

/// Common period lengths, in seconds.
pub mod periods {
    pub const DAILY: u64 = 86_400;
    pub const WEEKLY: u64 = 604_800;
    pub const MONTHLY: u64 = super::DEFAULT_PERIOD_SECS;
    pub const YEARLY: u64 = 31_536_000;
}

/// Result of one accrual computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    /// `streamed + unrealizedSalary`.
    pub current_balance: Amount,
    pub salary_per_second: Amount,
    pub time_elapsed: u64,
    /// Lifetime earnings including `streamed`.
    pub total_earned: Amount,
    pub unrealized_salary: Amount,
    /// Salary streamed since the last checkpoint.
    pub streamed: Amount,
    /// `false` for the zero-accrual fallback: the employee is not streaming
    /// or its organization is unknown.
    pub active: bool,
}

impl Accrual {
    /// Zero accrual. Lifetime earnings and the unrealized balance pass
    /// through unchanged.
    pub fn idle(employee: Option<&EmployeeEntry>) -> Self {
        Self {
            current_balance: Amount::zero(),
            salary_per_second: Amount::zero(),
            time_elapsed: 0,
            total_earned: employee.map_or_else(Amount::zero, |e| e.total_earned),
            unrealized_salary: employee.map_or_else(Amount::zero, |e| e.unrealized_salary),
            streamed: Amount::zero(),
            active: false,
        }
    }
}

/// Per-second rate for `salary` over `period_secs`. A zero period is treated
/// as [`DEFAULT_PERIOD_SECS`].
pub fn salary_per_second(salary: Amount, period_secs: u64) -> Amount {
    let period = if period_secs == 0 {
        DEFAULT_PERIOD_SECS
    } else {
        period_secs
    };
    salary / Amount::from(period)
}

/// Project `employee`'s balance at `at`.
///
/// `default_period_secs` replaces a zero `periodTime` on the organization.
pub fn compute_accrual(
    employee: Option<&EmployeeEntry>,
    organization: Option<&OrganizationEntry>,
    at: Timestamp,
    default_period_secs: u64,
) -> Result<Accrual, LedgerError> {
    let employee = match employee {
        Some(e) if e.is_streaming() => e,
        other => return Ok(Accrual::idle(other)),
    };
    let Some(organization) = organization else {
        return Ok(Accrual::idle(Some(employee)));
    };

    let rate = salary_per_second(
        employee.salary,
        organization.effective_period(default_period_secs),
    );
    let time_elapsed = at.saturating_sub(employee.salary_stream_start_time);
    let streamed = rate
        .checked_mul(Amount::from(time_elapsed))
        .ok_or(LedgerError::ArithmeticOverflow { field: "streamed" })?;
    let current_balance = streamed
        .checked_add(employee.unrealized_salary)
        .ok_or(LedgerError::ArithmeticOverflow {
            field: "currentSalaryBalance",
        })?;
    let total_earned = streamed
        .checked_add(employee.total_earned)
        .ok_or(LedgerError::ArithmeticOverflow {
            field: "totalEarned",
        })?;

    Ok(Accrual {
        current_balance,
        salary_per_second: rate,
        time_elapsed,
        total_earned,
        unrealized_salary: employee.unrealized_salary,
        streamed,
        active: true,
    })
}
