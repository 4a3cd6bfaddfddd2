//! # Ledger Invariants
//!
//! Checks that must hold after every handler completes. The dispatcher runs
//! them on the entries an event touched before committing and logs any
//! violation at `error`; the scenario tests run them on every row.

use shared_types::Amount;

use super::entities::{EmployeeEntry, JoinedViewEntry, OrganizationEntry};

/// A broken invariant, named after the field that is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub field: &'static str,
    pub expected: Amount,
    pub actual: Amount,
}

/// `currentBalance = max(0, totalDeposits - totalWithdrawals)` and
/// `shortfall = max(0, totalSalary - currentBalance)`.
pub fn check_organization(org: &OrganizationEntry) -> Result<(), InvariantViolation> {
    let expected_balance = org.total_deposits.saturating_sub(org.total_withdrawals);
    if org.current_balance != expected_balance {
        return Err(InvariantViolation {
            field: "currentBalance",
            expected: expected_balance,
            actual: org.current_balance,
        });
    }
    let expected_shortfall = org.total_salary.saturating_sub(org.current_balance);
    if org.shortfall != expected_shortfall {
        return Err(InvariantViolation {
            field: "shortfall",
            expected: expected_shortfall,
            actual: org.shortfall,
        });
    }
    Ok(())
}

/// `availableBalance` never exceeds `currentSalaryBalance`, and an
/// employee that is not enrolled holds no running balance.
pub fn check_employee(employee: &EmployeeEntry) -> Result<(), InvariantViolation> {
    if employee.available_balance > employee.current_salary_balance {
        return Err(InvariantViolation {
            field: "availableBalance",
            expected: employee.current_salary_balance,
            actual: employee.available_balance,
        });
    }
    if !employee.status && !employee.current_salary_balance.is_zero() {
        return Err(InvariantViolation {
            field: "currentSalaryBalance",
            expected: Amount::zero(),
            actual: employee.current_salary_balance,
        });
    }
    Ok(())
}

/// `totalSalary` equals the salary sum over active employees.
pub fn check_total_salary<'a>(
    org: &OrganizationEntry,
    employees: impl IntoIterator<Item = &'a EmployeeEntry>,
) -> Result<(), InvariantViolation> {
    let expected = employees
        .into_iter()
        .filter(|e| e.organization == org.organization)
        .fold(Amount::zero(), |acc, e| acc.saturating_add(e.salary_contribution()));
    if org.total_salary != expected {
        return Err(InvariantViolation {
            field: "totalSalary",
            expected,
            actual: org.total_salary,
        });
    }
    Ok(())
}

/// A joined view row is current when it mirrors its organization.
pub fn check_joined_view(
    view: &JoinedViewEntry,
    org: &OrganizationEntry,
) -> Result<(), InvariantViolation> {
    if view.mirrors(org) {
        Ok(())
    } else {
        Err(InvariantViolation {
            field: "joinedView",
            expected: org.total_salary,
            actual: view.total_salary,
        })
    }
}
