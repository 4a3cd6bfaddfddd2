//! Organization Ledger operations.
//!
//! `totalSalary` is only ever moved by deltas from the employee path; it is
//! read, never recomputed, by [`recalculate_metrics`].

use shared_types::{Address, Amount};
use tracing::debug;

use super::{add, EventScope};
use crate::domain::{LedgerError, OrgCounter, OrganizationEntry};

/// Partial update for an organization. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationChange {
    pub name: Option<String>,
    pub owner: Option<Address>,
    pub token: Option<Address>,
    pub period_time: Option<u64>,
}

impl OrganizationChange {
    fn apply(self, entry: &mut OrganizationEntry) {
        if let Some(name) = self.name {
            entry.name = name;
        }
        if let Some(owner) = self.owner {
            entry.owner = owner;
        }
        if let Some(token) = self.token {
            entry.token = token;
        }
        if let Some(period_time) = self.period_time {
            entry.period_time = period_time;
        }
    }
}

/// Insert with defaults if absent, else apply `change` in place.
pub fn upsert(
    scope: &mut EventScope<'_>,
    organization: Address,
    change: OrganizationChange,
) -> Result<OrganizationEntry, LedgerError> {
    let mut entry = match scope.tx.organization(&organization)? {
        Some(existing) => existing,
        None => {
            debug!(organization = %organization, "Creating organization entry");
            OrganizationEntry::new(organization, scope.config.default_period_secs, &scope.ctx)
        }
    };
    change.apply(&mut entry);
    entry.touch(&scope.ctx);
    scope.tx.put_organization(entry.clone());
    Ok(entry)
}

/// Read-modify-write an existing organization. A missing one is skipped.
fn update_existing(
    scope: &mut EventScope<'_>,
    organization: Address,
    mutate: impl FnOnce(&EventScope<'_>, &mut OrganizationEntry) -> Result<(), LedgerError>,
) -> Result<bool, LedgerError> {
    let Some(mut entry) = scope.tx.organization(&organization)? else {
        debug!(organization = %organization, "Organization not found; update skipped");
        return Ok(false);
    };
    mutate(scope, &mut entry)?;
    entry.touch(&scope.ctx);
    scope.tx.put_organization(entry);
    Ok(true)
}

pub fn increment_counter(
    scope: &mut EventScope<'_>,
    organization: Address,
    counter: OrgCounter,
) -> Result<bool, LedgerError> {
    update_existing(scope, organization, |_, entry| {
        entry.increment(counter);
        Ok(())
    })
}

/// Decrement clamped at zero.
pub fn decrement_counter(
    scope: &mut EventScope<'_>,
    organization: Address,
    counter: OrgCounter,
) -> Result<bool, LedgerError> {
    update_existing(scope, organization, |scope, entry| {
        if !entry.decrement(counter) {
            debug!(
                organization = %entry.organization,
                counter = counter.as_str(),
                floored = true,
                "Counter already at zero"
            );
            scope.metrics.record_floor(counter.as_str());
        }
        Ok(())
    })
}

/// Move `totalSalary` by `added - removed`.
pub fn adjust_total_salary(
    scope: &mut EventScope<'_>,
    organization: Address,
    removed: Amount,
    added: Amount,
) -> Result<bool, LedgerError> {
    if removed == added {
        return Ok(false);
    }
    update_existing(scope, organization, |scope, entry| {
        let raised = add(entry.total_salary, added, "totalSalary")?;
        entry.total_salary = scope.floor_sub(raised, removed, "totalSalary");
        Ok(())
    })
}

pub fn add_deposits(
    scope: &mut EventScope<'_>,
    organization: Address,
    amount: Amount,
) -> Result<bool, LedgerError> {
    update_existing(scope, organization, |_, entry| {
        entry.total_deposits = add(entry.total_deposits, amount, "totalDeposits")?;
        Ok(())
    })
}

pub fn add_withdrawals(
    scope: &mut EventScope<'_>,
    organization: Address,
    amount: Amount,
) -> Result<bool, LedgerError> {
    update_existing(scope, organization, |_, entry| {
        entry.total_withdrawals = add(entry.total_withdrawals, amount, "totalWithdrawals")?;
        Ok(())
    })
}

/// Recompute `currentBalance` and `shortfall` from the stored totals.
pub fn recalculate_metrics(
    scope: &mut EventScope<'_>,
    organization: Address,
) -> Result<bool, LedgerError> {
    update_existing(scope, organization, |scope, entry| {
        if entry.recalculate() {
            debug!(
                organization = %entry.organization,
                total_deposits = %entry.total_deposits,
                total_withdrawals = %entry.total_withdrawals,
                floored = true,
                "Withdrawals exceed deposits; balance clamped at zero"
            );
            scope.metrics.record_floor("currentBalance");
        }
        Ok(())
    })
}
