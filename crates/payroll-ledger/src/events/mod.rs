//! # Events
//!
//! The typed event feed consumed by the dispatcher, and the raw record that
//! is appended to the event log for every event received.
//!
//! ## Wire Format
//!
//! One JSON object per event:
//!
//! ```json
//! {
//!   "organization": "0x…",          // emitting contract
//!   "blockNumber": 123,
//!   "blockTimestamp": 1700000000,
//!   "transactionHash": "0x…",
//!   "event": { "type": "Deposit", "args": { "owner": "0x…", "amount": "1000" } }
//! }
//! ```

pub mod payloads;

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Address, Timestamp, TxHash};

use crate::domain::{EventContext, LedgerError};
pub use payloads::*;

/// Discriminant of [`DomainEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    OrganizationCreated,
    EmployeeSalaryAdded,
    EmployeeSalarySet,
    EmployeeStatusChanged,
    EarnSalary,
    Deposit,
    Withdraw,
    WithdrawAll,
    WithdrawBalanceOrganization,
    EnableAutoEarn,
    DisableAutoEarn,
    PeriodTimeSet,
    SetName,
    SetEmployeeName,
}

impl EventKind {
    /// Number of kinds.
    pub const COUNT: usize = 14;

    /// Every kind, in declaration order.
    pub const ALL: [EventKind; Self::COUNT] = [
        Self::OrganizationCreated,
        Self::EmployeeSalaryAdded,
        Self::EmployeeSalarySet,
        Self::EmployeeStatusChanged,
        Self::EarnSalary,
        Self::Deposit,
        Self::Withdraw,
        Self::WithdrawAll,
        Self::WithdrawBalanceOrganization,
        Self::EnableAutoEarn,
        Self::DisableAutoEarn,
        Self::PeriodTimeSet,
        Self::SetName,
        Self::SetEmployeeName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrganizationCreated => "OrganizationCreated",
            Self::EmployeeSalaryAdded => "EmployeeSalaryAdded",
            Self::EmployeeSalarySet => "EmployeeSalarySet",
            Self::EmployeeStatusChanged => "EmployeeStatusChanged",
            Self::EarnSalary => "EarnSalary",
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
            Self::WithdrawAll => "WithdrawAll",
            Self::WithdrawBalanceOrganization => "WithdrawBalanceOrganization",
            Self::EnableAutoEarn => "EnableAutoEarn",
            Self::DisableAutoEarn => "DisableAutoEarn",
            Self::PeriodTimeSet => "PeriodTimeSet",
            Self::SetName => "SetName",
            Self::SetEmployeeName => "SetEmployeeName",
        }
    }

    /// Position in [`EventKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded contract event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args")]
pub enum DomainEvent {
    OrganizationCreated(OrganizationCreatedPayload),
    EmployeeSalaryAdded(EmployeeSalaryAddedPayload),
    EmployeeSalarySet(EmployeeSalarySetPayload),
    EmployeeStatusChanged(EmployeeStatusChangedPayload),
    EarnSalary(EarnSalaryPayload),
    Deposit(DepositPayload),
    Withdraw(WithdrawPayload),
    WithdrawAll(WithdrawAllPayload),
    WithdrawBalanceOrganization(WithdrawBalanceOrganizationPayload),
    EnableAutoEarn(EnableAutoEarnPayload),
    DisableAutoEarn(DisableAutoEarnPayload),
    PeriodTimeSet(PeriodTimeSetPayload),
    SetName(SetNamePayload),
    SetEmployeeName(SetEmployeeNamePayload),
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::OrganizationCreated(_) => EventKind::OrganizationCreated,
            Self::EmployeeSalaryAdded(_) => EventKind::EmployeeSalaryAdded,
            Self::EmployeeSalarySet(_) => EventKind::EmployeeSalarySet,
            Self::EmployeeStatusChanged(_) => EventKind::EmployeeStatusChanged,
            Self::EarnSalary(_) => EventKind::EarnSalary,
            Self::Deposit(_) => EventKind::Deposit,
            Self::Withdraw(_) => EventKind::Withdraw,
            Self::WithdrawAll(_) => EventKind::WithdrawAll,
            Self::WithdrawBalanceOrganization(_) => EventKind::WithdrawBalanceOrganization,
            Self::EnableAutoEarn(_) => EventKind::EnableAutoEarn,
            Self::DisableAutoEarn(_) => EventKind::DisableAutoEarn,
            Self::PeriodTimeSet(_) => EventKind::PeriodTimeSet,
            Self::SetName(_) => EventKind::SetName,
            Self::SetEmployeeName(_) => EventKind::SetEmployeeName,
        }
    }

    /// Employee the event concerns, if any.
    pub fn employee(&self) -> Option<Address> {
        match self {
            Self::EmployeeSalaryAdded(p) => Some(p.employee),
            Self::EmployeeSalarySet(p) => Some(p.employee),
            Self::EmployeeStatusChanged(p) => Some(p.employee),
            Self::EarnSalary(p) => Some(p.employee),
            Self::Withdraw(p) => Some(p.employee),
            Self::WithdrawAll(p) => Some(p.employee),
            Self::EnableAutoEarn(p) => Some(p.employee),
            Self::DisableAutoEarn(p) => Some(p.employee),
            Self::SetEmployeeName(p) => Some(p.employee),
            Self::OrganizationCreated(_)
            | Self::Deposit(_)
            | Self::WithdrawBalanceOrganization(_)
            | Self::PeriodTimeSet(_)
            | Self::SetName(_) => None,
        }
    }
}

/// An event with its chain position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Address of the contract that emitted the log.
    pub organization: Address,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
    pub transaction_hash: TxHash,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(
        organization: Address,
        block_number: u64,
        block_timestamp: Timestamp,
        transaction_hash: TxHash,
        event: DomainEvent,
    ) -> Self {
        Self {
            organization,
            block_number,
            block_timestamp,
            transaction_hash,
            event,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Organization whose ledgers the event updates. For
    /// `OrganizationCreated` that is the new contract, not the factory.
    pub fn ledger_organization(&self) -> Address {
        match &self.event {
            DomainEvent::OrganizationCreated(p) => p.organization,
            _ => self.organization,
        }
    }

    pub fn context(&self) -> EventContext {
        EventContext::new(self.block_number, self.block_timestamp, self.transaction_hash)
    }
}

/// Audit copy of an event as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventRecord {
    /// SHA-256 hex of `"{tx}-{block}-{timestamp}-{random}"`.
    pub id: String,
    pub kind: EventKind,
    pub organization: Address,
    pub block_number: u64,
    pub block_timestamp: Timestamp,
    pub transaction_hash: TxHash,
    /// Event arguments as JSON.
    pub payload: serde_json::Value,
}

impl RawEventRecord {
    /// Build the record for `envelope` with a fresh random id.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Self, LedgerError> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(envelope, &salt)
    }

    /// Build the record with a caller-chosen salt. Same inputs, same id.
    pub fn with_salt(envelope: &EventEnvelope, salt: &[u8]) -> Result<Self, LedgerError> {
        let tagged = serde_json::to_value(&envelope.event)?;
        let payload = tagged
            .get("args")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Ok(Self {
            id: record_id(envelope, salt),
            kind: envelope.kind(),
            organization: envelope.ledger_organization(),
            block_number: envelope.block_number,
            block_timestamp: envelope.block_timestamp,
            transaction_hash: envelope.transaction_hash,
            payload,
        })
    }
}

fn record_id(envelope: &EventEnvelope, salt: &[u8]) -> String {
    let seed = format!(
        "{}-{}-{}-{}",
        envelope.transaction_hash,
        envelope.block_number,
        envelope.block_timestamp,
        hex::encode(salt)
    );
    hex::encode(Sha256::digest(seed.as_bytes()))
}
