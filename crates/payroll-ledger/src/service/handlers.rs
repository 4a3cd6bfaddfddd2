//! One handler per event kind.
//!
//! Handlers only stage writes; the dispatcher commits them. Any handler
//! that moves an organization total ends with `recalculate_metrics`, then
//! fans the organization out to every member's joined view. Handlers that
//! only touch one employee refresh that employee's view.

use shared_types::Address;
use tracing::{debug, info};

use super::{add, employee, joined_view, organization, EventScope, OrganizationChange};
use crate::domain::{
    AutoEarnEntry, AutoEarnKey, EmployeeChange, EmployeeKey, LedgerError, OrgCounter,
};
use crate::events::*;

/// Apply `envelope` to the ledgers staged in `scope`.
pub fn handle(scope: &mut EventScope<'_>, envelope: &EventEnvelope) -> Result<(), LedgerError> {
    let org = envelope.ledger_organization();
    match &envelope.event {
        DomainEvent::OrganizationCreated(p) => on_organization_created(scope, p),
        DomainEvent::EmployeeSalaryAdded(p) => on_employee_salary_added(scope, org, p),
        DomainEvent::EmployeeSalarySet(p) => on_employee_salary_set(scope, org, p),
        DomainEvent::EmployeeStatusChanged(p) => on_employee_status_changed(scope, org, p),
        DomainEvent::EarnSalary(p) => on_earn_salary(scope, org, p),
        DomainEvent::Deposit(p) => on_deposit(scope, org, p),
        DomainEvent::Withdraw(p) => on_withdraw(scope, org, p),
        DomainEvent::WithdrawAll(p) => on_withdraw_all(scope, org, p),
        DomainEvent::WithdrawBalanceOrganization(p) => on_withdraw_balance(scope, org, p),
        DomainEvent::EnableAutoEarn(p) => on_enable_auto_earn(scope, org, p),
        DomainEvent::DisableAutoEarn(p) => on_disable_auto_earn(scope, org, p),
        DomainEvent::PeriodTimeSet(p) => on_period_time_set(scope, org, p),
        DomainEvent::SetName(p) => on_set_name(scope, org, p),
        DomainEvent::SetEmployeeName(p) => on_set_employee_name(scope, org, p),
    }
}

fn on_organization_created(
    scope: &mut EventScope<'_>,
    p: &OrganizationCreatedPayload,
) -> Result<(), LedgerError> {
    organization::upsert(
        scope,
        p.organization,
        OrganizationChange {
            name: Some(p.name.clone()),
            owner: Some(p.owner),
            token: Some(p.token),
            period_time: None,
        },
    )?;
    info!(
        organization = %p.organization,
        owner = %p.owner,
        name = %p.name,
        "Organization created"
    );
    Ok(())
}

fn on_employee_salary_added(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &EmployeeSalaryAddedPayload,
) -> Result<(), LedgerError> {
    let change = EmployeeChange::new()
        .with_name(p.name.clone())
        .with_salary(p.salary)
        .with_stream_start(p.start_stream);
    employee::apply_employee_change(scope, org, p.employee, change)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_employee_salary_set(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &EmployeeSalarySetPayload,
) -> Result<(), LedgerError> {
    let change = EmployeeChange::new()
        .with_salary(p.salary)
        .with_stream_start(p.start_stream)
        .settling();
    employee::apply_employee_change(scope, org, p.employee, change)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_employee_status_changed(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &EmployeeStatusChangedPayload,
) -> Result<(), LedgerError> {
    let change = EmployeeChange::new().with_status(p.status);
    employee::apply_employee_change(scope, org, p.employee, change)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_earn_salary(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &EarnSalaryPayload,
) -> Result<(), LedgerError> {
    let key = EmployeeKey::new(org, p.employee);
    if employee::record_earn(scope, key, p.amount)?.is_none() {
        debug!(organization = %org, employee = %p.employee, "Unknown employee; earn ignored");
        return Ok(());
    }
    organization::add_withdrawals(scope, org, p.amount)?;

    let auto_key = AutoEarnKey::new(org, p.employee, p.protocol);
    if let Some(mut entry) = scope.tx.auto_earn(&auto_key)? {
        entry.total_shares = add(entry.total_shares, p.shares, "totalShares")?;
        entry.total_earned = add(entry.total_earned, p.amount, "totalEarned")?;
        entry.touch(&scope.ctx);
        scope.tx.put_auto_earn(entry);
    }

    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_deposit(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &DepositPayload,
) -> Result<(), LedgerError> {
    if !organization::add_deposits(scope, org, p.amount)? {
        return Ok(());
    }
    organization::increment_counter(scope, org, OrgCounter::CountDeposits)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_withdraw(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &WithdrawPayload,
) -> Result<(), LedgerError> {
    let key = EmployeeKey::new(org, p.employee);
    let recorded =
        employee::record_withdraw(scope, key, p.amount, p.unrealized_salary, p.start_stream)?;
    if recorded.is_none() {
        debug!(organization = %org, employee = %p.employee, "Unknown employee; withdrawal ignored");
        return Ok(());
    }
    record_employee_withdrawal(scope, org, p.amount)
}

fn on_withdraw_all(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &WithdrawAllPayload,
) -> Result<(), LedgerError> {
    let key = EmployeeKey::new(org, p.employee);
    if employee::record_withdraw_all(scope, key, p.amount, p.start_stream)?.is_none() {
        debug!(organization = %org, employee = %p.employee, "Unknown employee; withdrawal ignored");
        return Ok(());
    }
    record_employee_withdrawal(scope, org, p.amount)
}

/// Organization side of an employee withdrawal.
fn record_employee_withdrawal(
    scope: &mut EventScope<'_>,
    org: Address,
    amount: shared_types::Amount,
) -> Result<(), LedgerError> {
    organization::add_withdrawals(scope, org, amount)?;
    organization::increment_counter(scope, org, OrgCounter::CountWithdraws)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_withdraw_balance(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &WithdrawBalanceOrganizationPayload,
) -> Result<(), LedgerError> {
    if !organization::add_withdrawals(scope, org, p.amount)? {
        return Ok(());
    }
    organization::increment_counter(scope, org, OrgCounter::CountWithdraws)?;
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_enable_auto_earn(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &EnableAutoEarnPayload,
) -> Result<(), LedgerError> {
    let key = AutoEarnKey::new(org, p.employee, p.protocol);
    let mut entry = scope
        .tx
        .auto_earn(&key)?
        .unwrap_or_else(|| AutoEarnEntry::new(key, &scope.ctx));
    entry.auto_earn_amount = p.amount;
    entry.is_auto_earn = true;
    entry.is_active = true;
    entry.enabled_at = scope.now();
    entry.disabled_at = 0;
    entry.touch(&scope.ctx);
    scope.tx.put_auto_earn(entry);

    employee::refresh_auto_earn_status(scope, key.employee_key())?;
    joined_view::refresh(scope, p.employee, org)?;
    Ok(())
}

fn on_disable_auto_earn(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &DisableAutoEarnPayload,
) -> Result<(), LedgerError> {
    let key = AutoEarnKey::new(org, p.employee, p.protocol);
    let mut entry = scope
        .tx
        .auto_earn(&key)?
        .unwrap_or_else(|| AutoEarnEntry::new(key, &scope.ctx));
    entry.is_auto_earn = false;
    entry.is_active = false;
    entry.disabled_at = scope.now();
    entry.touch(&scope.ctx);
    scope.tx.put_auto_earn(entry);

    employee::refresh_auto_earn_status(scope, key.employee_key())?;
    joined_view::refresh(scope, p.employee, org)?;
    Ok(())
}

fn on_period_time_set(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &PeriodTimeSetPayload,
) -> Result<(), LedgerError> {
    let new_period = if p.period_time == 0 {
        scope.config.default_period_secs
    } else {
        p.period_time
    };

    // Settle at the old rate before the period changes.
    let mut paid = shared_types::Amount::zero();
    let members = scope.tx.members(&org)?;
    for member in &members {
        let settled = employee::rebase_period(scope, EmployeeKey::new(org, *member), new_period)?;
        paid = add(paid, settled, "settlement")?;
    }

    organization::upsert(
        scope,
        org,
        OrganizationChange {
            period_time: Some(p.period_time),
            ..Default::default()
        },
    )?;
    if !paid.is_zero() {
        organization::add_withdrawals(scope, org, paid)?;
    }
    organization::recalculate_metrics(scope, org)?;
    joined_view::fan_out(scope, org)?;

    info!(
        organization = %org,
        period_time = p.period_time,
        members = members.len(),
        settled = %paid,
        "Streaming period changed"
    );
    Ok(())
}

fn on_set_name(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &SetNamePayload,
) -> Result<(), LedgerError> {
    organization::upsert(
        scope,
        org,
        OrganizationChange {
            name: Some(p.name.clone()),
            ..Default::default()
        },
    )?;
    joined_view::fan_out(scope, org)?;
    Ok(())
}

fn on_set_employee_name(
    scope: &mut EventScope<'_>,
    org: Address,
    p: &SetEmployeeNamePayload,
) -> Result<(), LedgerError> {
    let key = EmployeeKey::new(org, p.employee);
    if scope.tx.employee(&key)?.is_none() {
        debug!(organization = %org, employee = %p.employee, "Unknown employee; rename ignored");
        return Ok(());
    }
    employee::apply_employee_change(
        scope,
        org,
        p.employee,
        EmployeeChange::new().with_name(p.name.clone()),
    )?;
    joined_view::refresh(scope, p.employee, org)?;
    Ok(())
}
