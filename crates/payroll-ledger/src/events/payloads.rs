//! Event payloads, one struct per contract event.
//!
//! Field names follow the contract ABI (camelCase on the wire). Amounts are
//! decimal strings or JSON integers.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, Timestamp};

/// Emitted by the factory when a new organization contract is deployed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationCreatedPayload {
    pub owner: Address,
    /// Address of the new organization contract.
    pub organization: Address,
    pub name: String,
    pub token: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSalaryAddedPayload {
    pub employee: Address,
    #[serde(default)]
    pub name: String,
    #[serde(with = "shared_types::amount")]
    pub salary: Amount,
    #[serde(default)]
    pub start_stream: Timestamp,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub is_auto_earn: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSalarySetPayload {
    pub employee: Address,
    #[serde(with = "shared_types::amount")]
    pub salary: Amount,
    #[serde(default)]
    pub start_stream: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStatusChangedPayload {
    pub employee: Address,
    pub status: bool,
}

/// Accrued salary moved into a yield protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnSalaryPayload {
    pub employee: Address,
    pub protocol: Address,
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
    #[serde(with = "shared_types::amount")]
    pub shares: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositPayload {
    pub owner: Address,
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
}

/// Partial withdrawal by an employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawPayload {
    pub employee: Address,
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
    /// Balance the contract carries forward after the withdrawal.
    #[serde(with = "shared_types::amount")]
    pub unrealized_salary: Amount,
    #[serde(default)]
    pub is_offramp: bool,
    #[serde(default)]
    pub start_stream: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawAllPayload {
    pub employee: Address,
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
    #[serde(default)]
    pub is_offramp: bool,
    #[serde(default)]
    pub start_stream: Timestamp,
}

/// Owner pulls funds out of the organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawBalanceOrganizationPayload {
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
    #[serde(default)]
    pub is_offramp: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableAutoEarnPayload {
    pub employee: Address,
    pub protocol: Address,
    #[serde(with = "shared_types::amount")]
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisableAutoEarnPayload {
    pub employee: Address,
    pub protocol: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTimeSetPayload {
    pub period_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNamePayload {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEmployeeNamePayload {
    pub employee: Address,
    pub name: String,
}
