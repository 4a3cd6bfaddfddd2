//! Employee Ledger operations.
//!
//! ## Checkpoints
//!
//! Before any field that feeds the accrual changes (status, salary, period,
//! balances) the running balance is folded in at the event's timestamp:
//!
//! ```text
//! current = available = unrealized = streamed + unrealized
//! totalEarned += streamed
//! streamStart  = max(streamStart, now)
//! ```
//!
//! A second checkpoint at the same timestamp streams nothing and leaves the
//! entry unchanged. A settlement then pays the carried `unrealized` balance,
//! which equals `current` whenever the checkpoint ran.

use shared_types::{Address, Amount};
use tracing::{debug, warn};

use super::{add, organization, EventScope};
use crate::domain::{
    compute_accrual, salary_per_second, Accrual, EmployeeChange, EmployeeEntry, EmployeeKey,
    FailureClass, LedgerError, OrgCounter,
};

/// Accrual for `entry` at the event's timestamp. `None` when nothing
/// streams, or when the computation degraded to zero.
fn accrue(scope: &EventScope<'_>, entry: &EmployeeEntry) -> Result<Option<Accrual>, LedgerError> {
    let attempt = scope
        .tx
        .organization(&entry.organization)
        .and_then(|org| {
            compute_accrual(
                Some(entry),
                org.as_ref(),
                scope.now(),
                scope.config.default_period_secs,
            )
        })
        .map_err(LedgerError::accrual);

    match attempt {
        Ok(accrual) if accrual.active => Ok(Some(accrual)),
        Ok(_) => Ok(None),
        Err(err) => match err.class() {
            FailureClass::Degrade => {
                warn!(
                    organization = %entry.organization,
                    employee = %entry.employee,
                    tx_hash = %scope.ctx.tx_hash,
                    error = %err,
                    "Accrual unavailable; balance left at last checkpoint"
                );
                scope.metrics.record_degraded_accrual();
                Ok(None)
            }
            FailureClass::Fatal => Err(err),
        },
    }
}

/// Fold the streamed balance into `entry` at the event's timestamp.
pub fn checkpoint(scope: &EventScope<'_>, entry: &mut EmployeeEntry) -> Result<(), LedgerError> {
    if !entry.is_streaming() {
        return Ok(());
    }
    let Some(accrual) = accrue(scope, entry)? else {
        return Ok(());
    };
    let now = scope.now();
    entry.current_salary_balance = accrual.current_balance;
    entry.available_balance = accrual.current_balance;
    entry.unrealized_salary = accrual.current_balance;
    entry.total_earned = accrual.total_earned;
    entry.salary_per_second = accrual.salary_per_second;
    entry.salary_stream_start_time = entry.salary_stream_start_time.max(now);
    entry.salary_balance_timestamp = now;
    entry.last_balance_update = now;
    Ok(())
}

/// Pay out the carried balance. Returns the amount paid.
///
/// A degraded checkpoint leaves `current` at its last value, which may
/// include amounts already withdrawn; only `unrealized` is still owed.
pub fn settle(scope: &EventScope<'_>, entry: &mut EmployeeEntry) -> Result<Amount, LedgerError> {
    let paid = entry.unrealized_salary;
    entry.total_withdrawn = add(entry.total_withdrawn, paid, "totalWithdrawn")?;
    entry.last_compensation_salary = paid;
    entry.clear_balances();
    entry.last_balance_update = scope.now();
    if !paid.is_zero() {
        debug!(
            organization = %entry.organization,
            employee = %entry.employee,
            paid = %paid,
            "Accrued salary settled"
        );
    }
    Ok(paid)
}

/// Create or update an employee, keeping the organization's salary total,
/// employee counters and withdrawals in step.
pub fn apply_employee_change(
    scope: &mut EventScope<'_>,
    organization: Address,
    employee: Address,
    change: EmployeeChange,
) -> Result<EmployeeEntry, LedgerError> {
    scope.tx.add_member(organization, employee);
    let key = EmployeeKey::new(organization, employee);
    let default_period = scope.config.default_period_secs;
    let period = scope
        .tx
        .organization(&organization)?
        .map_or(default_period, |org| org.effective_period(default_period));

    let Some(mut entry) = scope.tx.employee(&key)? else {
        return insert_employee(scope, key, change, period);
    };

    let now = scope.now();
    let contribution_before = entry.salary_contribution();
    let was_active = entry.status;
    checkpoint(scope, &mut entry)?;
    let mut paid = Amount::zero();

    if let Some(name) = change.name.clone() {
        entry.name = name;
    }

    if let Some(status) = change.status {
        entry.last_status_updated = now;
        match (was_active, status) {
            (true, false) => {
                paid = add(paid, settle(scope, &mut entry)?, "settlement")?;
                entry.status = false;
                entry.streaming_active = false;
            }
            (false, true) => {
                entry.status = true;
                entry.streaming_active = true;
                entry.salary_stream_start_time = now;
                entry.clear_balances();
                entry.last_compensation_salary = Amount::zero();
                entry.salary_balance_timestamp = now;
                entry.last_balance_update = now;
            }
            (true, true) if !entry.streaming_active => {
                entry.streaming_active = true;
                entry.salary_stream_start_time = now;
            }
            _ => {}
        }
    }

    if let Some(salary) = change.salary {
        if change.settle_on_salary_change && entry.is_streaming() {
            paid = add(paid, settle(scope, &mut entry)?, "settlement")?;
        }
        entry.salary = salary;
        entry.salary_per_second = salary_per_second(salary, period);
        // Time up to `now` is already checkpointed.
        entry.salary_stream_start_time = change.resolved_stream_start(now).max(now);
        entry.last_salary_updated = now;
        entry.last_balance_update = now;
    }

    entry.touch(&scope.ctx);
    let contribution_after = entry.salary_contribution();
    let is_active = entry.status;
    scope.tx.put_employee(entry.clone());

    organization::adjust_total_salary(scope, organization, contribution_before, contribution_after)?;
    match (was_active, is_active) {
        (false, true) => {
            organization::increment_counter(scope, organization, OrgCounter::ActiveEmployees)?;
        }
        (true, false) => {
            organization::decrement_counter(scope, organization, OrgCounter::ActiveEmployees)?;
        }
        _ => {}
    }
    if !paid.is_zero() {
        organization::add_withdrawals(scope, organization, paid)?;
    }
    Ok(entry)
}

fn insert_employee(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
    change: EmployeeChange,
    period: u64,
) -> Result<EmployeeEntry, LedgerError> {
    let now = scope.now();
    let mut entry = EmployeeEntry::new(key, &scope.ctx);
    let status = change.status.unwrap_or(true);
    entry.status = status;
    entry.streaming_active = status;
    entry.salary_stream_start_time = change.resolved_stream_start(now);
    if let Some(name) = change.name {
        entry.name = name;
    }
    if change.status.is_some() {
        entry.last_status_updated = now;
    }
    if let Some(salary) = change.salary {
        entry.salary = salary;
        entry.salary_per_second = salary_per_second(salary, period);
        entry.last_salary_updated = now;
    }
    scope.tx.put_employee(entry.clone());

    debug!(
        organization = %key.organization,
        employee = %key.employee,
        salary = %entry.salary,
        status,
        "Employee added"
    );

    organization::increment_counter(scope, key.organization, OrgCounter::TotalEmployees)?;
    if status {
        organization::increment_counter(scope, key.organization, OrgCounter::ActiveEmployees)?;
    }
    organization::adjust_total_salary(
        scope,
        key.organization,
        Amount::zero(),
        entry.salary_contribution(),
    )?;
    Ok(entry)
}

/// Settle a streaming employee at the old period and restart its stream at
/// the rate for `new_period`. Returns the amount paid.
pub fn rebase_period(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
    new_period: u64,
) -> Result<Amount, LedgerError> {
    let Some(mut entry) = scope.tx.employee(&key)? else {
        return Ok(Amount::zero());
    };
    let mut paid = Amount::zero();
    if entry.is_streaming() {
        checkpoint(scope, &mut entry)?;
        paid = settle(scope, &mut entry)?;
        entry.salary_stream_start_time = scope.now();
        entry.salary_balance_timestamp = scope.now();
    }
    entry.salary_per_second = salary_per_second(entry.salary, new_period);
    entry.touch(&scope.ctx);
    scope.tx.put_employee(entry);
    Ok(paid)
}

/// Salary moved into a yield protocol. `None` if the employee is unknown.
pub fn record_earn(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
    amount: Amount,
) -> Result<Option<EmployeeEntry>, LedgerError> {
    let Some(mut entry) = scope.tx.employee(&key)? else {
        return Ok(None);
    };
    checkpoint(scope, &mut entry)?;
    let remaining = scope.floor_sub(entry.current_salary_balance, amount, "currentSalaryBalance");
    entry.current_salary_balance = remaining;
    entry.available_balance = remaining;
    entry.unrealized_salary = remaining;
    entry.total_withdrawn = add(entry.total_withdrawn, amount, "totalWithdrawn")?;
    entry.salary_stream_start_time = scope.now();
    entry.last_balance_update = scope.now();
    entry.touch(&scope.ctx);
    scope.tx.put_employee(entry.clone());
    Ok(Some(entry))
}

/// Partial withdrawal. The contract reports the balance it carries forward
/// and where the next stream starts.
pub fn record_withdraw(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
    amount: Amount,
    unrealized: Amount,
    stream_start: u64,
) -> Result<Option<EmployeeEntry>, LedgerError> {
    let Some(mut entry) = scope.tx.employee(&key)? else {
        return Ok(None);
    };
    checkpoint(scope, &mut entry)?;
    entry.available_balance =
        scope.floor_sub(entry.current_salary_balance, amount, "availableBalance");
    entry.total_withdrawn = add(entry.total_withdrawn, amount, "totalWithdrawn")?;
    entry.unrealized_salary = unrealized;
    entry.salary_stream_start_time = resolve_start(stream_start, scope.now());
    entry.last_balance_update = scope.now();
    entry.touch(&scope.ctx);
    scope.tx.put_employee(entry.clone());
    Ok(Some(entry))
}

/// Full withdrawal: every running balance goes to zero.
pub fn record_withdraw_all(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
    amount: Amount,
    stream_start: u64,
) -> Result<Option<EmployeeEntry>, LedgerError> {
    let Some(mut entry) = scope.tx.employee(&key)? else {
        return Ok(None);
    };
    checkpoint(scope, &mut entry)?;
    entry.total_withdrawn = add(entry.total_withdrawn, amount, "totalWithdrawn")?;
    entry.clear_balances();
    entry.last_compensation_salary = Amount::zero();
    entry.salary_stream_start_time = resolve_start(stream_start, scope.now());
    entry.last_balance_update = scope.now();
    entry.touch(&scope.ctx);
    scope.tx.put_employee(entry.clone());
    Ok(Some(entry))
}

/// Recompute `autoEarnStatus` from the employee's Auto-Earn entries.
pub fn refresh_auto_earn_status(
    scope: &mut EventScope<'_>,
    key: EmployeeKey,
) -> Result<bool, LedgerError> {
    let active = scope
        .tx
        .auto_earn_of(&key)?
        .iter()
        .any(|entry| entry.is_active);
    if let Some(mut entry) = scope.tx.employee(&key)? {
        entry.auto_earn_status = active;
        entry.touch(&scope.ctx);
        scope.tx.put_employee(entry);
    }
    Ok(active)
}

fn resolve_start(announced: u64, now: u64) -> u64 {
    if announced == 0 {
        now
    } else {
        announced
    }
}
