//! # Outbound Ports (Driven Ports)
//!
//! Storage the ledger needs from its host.

use std::collections::{BTreeMap, BTreeSet};

use shared_types::Address;

use crate::domain::{
    AutoEarnEntry, AutoEarnKey, EmployeeEntry, EmployeeKey, JoinedViewEntry, JoinedViewKey,
    LedgerError, OrganizationEntry,
};
use crate::events::RawEventRecord;

/// Key-value tables backing the four ledgers plus the membership index.
///
/// Reads return `Ok(None)` for a missing row. Writes only happen through
/// [`LedgerStore::commit`], which must apply the whole batch or nothing.
pub trait LedgerStore: Send + Sync {
    fn employee(&self, key: &EmployeeKey) -> Result<Option<EmployeeEntry>, LedgerError>;

    fn organization(&self, organization: &Address)
        -> Result<Option<OrganizationEntry>, LedgerError>;

    fn joined_view(&self, key: &JoinedViewKey) -> Result<Option<JoinedViewEntry>, LedgerError>;

    fn auto_earn(&self, key: &AutoEarnKey) -> Result<Option<AutoEarnEntry>, LedgerError>;

    /// Every Auto-Earn entry of one employee, any protocol.
    fn auto_earn_of(&self, employee: &EmployeeKey) -> Result<Vec<AutoEarnEntry>, LedgerError>;

    /// Employees ever observed for `organization`, in address order.
    fn members(&self, organization: &Address) -> Result<Vec<Address>, LedgerError>;

    /// Apply a batch atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), LedgerError>;
}

/// Append-only audit log of raw events.
pub trait RawEventLog: Send + Sync {
    fn append(&self, record: RawEventRecord) -> Result<(), LedgerError>;
}

/// Writes staged by one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub employees: BTreeMap<EmployeeKey, EmployeeEntry>,
    pub organizations: BTreeMap<Address, OrganizationEntry>,
    pub joined_views: BTreeMap<JoinedViewKey, JoinedViewEntry>,
    pub auto_earn: BTreeMap<AutoEarnKey, AutoEarnEntry>,
    /// New (organization, employee) membership pairs.
    pub members: BTreeSet<(Address, Address)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged rows.
    pub fn len(&self) -> usize {
        self.employees.len()
            + self.organizations.len()
            + self.joined_views.len()
            + self.auto_earn.len()
            + self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
