use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use shared_types::Address;

use crate::domain::{
    AutoEarnEntry, AutoEarnKey, EmployeeEntry, EmployeeKey, JoinedViewEntry, JoinedViewKey,
    LedgerError, OrganizationEntry,
};
use crate::events::RawEventRecord;
use crate::ports::{LedgerStore, RawEventLog, WriteBatch};

#[derive(Default)]
struct Tables {
    employees: HashMap<EmployeeKey, EmployeeEntry>,
    organizations: HashMap<Address, OrganizationEntry>,
    joined_views: HashMap<JoinedViewKey, JoinedViewEntry>,
    auto_earn: BTreeMap<AutoEarnKey, AutoEarnEntry>,
    members: HashMap<Address, BTreeSet<Address>>,
}

/// In-memory implementation of LedgerStore.
///
/// One lock covers every table, so a committed batch is visible all at once.
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Every employee row, in key order.
    pub fn all_employees(&self) -> Result<Vec<EmployeeEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        let mut rows: Vec<EmployeeEntry> = tables.employees.values().cloned().collect();
        rows.sort_by_key(EmployeeEntry::key);
        Ok(rows)
    }

    /// Every organization row, in address order.
    pub fn all_organizations(&self) -> Result<Vec<OrganizationEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        let mut rows: Vec<OrganizationEntry> = tables.organizations.values().cloned().collect();
        rows.sort_by_key(|org| org.organization);
        Ok(rows)
    }

    /// Every joined view row, in key order.
    pub fn all_joined_views(&self) -> Result<Vec<JoinedViewEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        let mut rows: Vec<JoinedViewEntry> = tables.joined_views.values().cloned().collect();
        rows.sort_by_key(JoinedViewEntry::key);
        Ok(rows)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn employee(&self, key: &EmployeeKey) -> Result<Option<EmployeeEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables.employees.get(key).cloned())
    }

    fn organization(
        &self,
        organization: &Address,
    ) -> Result<Option<OrganizationEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables.organizations.get(organization).cloned())
    }

    fn joined_view(&self, key: &JoinedViewKey) -> Result<Option<JoinedViewEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables.joined_views.get(key).cloned())
    }

    fn auto_earn(&self, key: &AutoEarnKey) -> Result<Option<AutoEarnEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables.auto_earn.get(key).cloned())
    }

    fn auto_earn_of(&self, employee: &EmployeeKey) -> Result<Vec<AutoEarnEntry>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables
            .auto_earn
            .values()
            .filter(|entry| entry.employee_key() == *employee)
            .cloned()
            .collect())
    }

    fn members(&self, organization: &Address) -> Result<Vec<Address>, LedgerError> {
        let tables = self.tables.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(tables
            .members
            .get(organization)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), LedgerError> {
        let mut tables = self.tables.write().map_err(|_| LedgerError::LockPoisoned)?;
        tables.employees.extend(batch.employees);
        tables.organizations.extend(batch.organizations);
        tables.joined_views.extend(batch.joined_views);
        tables.auto_earn.extend(batch.auto_earn);
        for (organization, employee) in batch.members {
            tables.members.entry(organization).or_default().insert(employee);
        }
        Ok(())
    }
}

/// In-memory implementation of RawEventLog.
pub struct InMemoryEventLog {
    records: RwLock<Vec<RawEventRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Records in append order.
    pub fn records(&self) -> Vec<RawEventRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RawEventLog for InMemoryEventLog {
    fn append(&self, record: RawEventRecord) -> Result<(), LedgerError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| LedgerError::EventLog("event log lock poisoned".into()))?;
        records.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventContext;
    use shared_types::TxHash;

    #[test]
    fn test_commit_applies_every_table() {
        let store = InMemoryLedgerStore::new();
        let ctx = EventContext::new(1, 10, TxHash::ZERO);
        let org = Address::repeat_byte(1);
        let emp = Address::repeat_byte(2);
        let protocol = Address::repeat_byte(3);

        let mut batch = WriteBatch::new();
        batch
            .employees
            .insert(EmployeeKey::new(org, emp), EmployeeEntry::new(EmployeeKey::new(org, emp), &ctx));
        batch
            .organizations
            .insert(org, OrganizationEntry::new(org, 60, &ctx));
        let auto_key = AutoEarnKey::new(org, emp, protocol);
        batch.auto_earn.insert(auto_key, AutoEarnEntry::new(auto_key, &ctx));
        batch.members.insert((org, emp));
        store.commit(batch).unwrap();

        assert!(store.employee(&EmployeeKey::new(org, emp)).unwrap().is_some());
        assert!(store.organization(&org).unwrap().is_some());
        assert_eq!(store.auto_earn_of(&EmployeeKey::new(org, emp)).unwrap().len(), 1);
        assert!(store
            .auto_earn_of(&EmployeeKey::new(org, protocol))
            .unwrap()
            .is_empty());
        assert_eq!(store.members(&org).unwrap(), vec![emp]);
        assert!(store.members(&emp).unwrap().is_empty());
        assert_eq!(store.all_employees().unwrap().len(), 1);
        assert_eq!(store.all_organizations().unwrap().len(), 1);
    }

    #[test]
    fn test_event_log_keeps_append_order() {
        let log = InMemoryEventLog::new();
        assert!(log.is_empty());
        let envelope = crate::events::EventEnvelope::new(
            Address::repeat_byte(1),
            1,
            1,
            TxHash::ZERO,
            crate::events::DomainEvent::SetName(crate::events::SetNamePayload {
                name: "a".into(),
            }),
        );
        let first = RawEventRecord::with_salt(&envelope, b"1").unwrap();
        let second = RawEventRecord::with_salt(&envelope, b"2").unwrap();
        log.append(first.clone()).unwrap();
        log.append(second.clone()).unwrap();
        assert_eq!(log.records(), vec![first, second]);
    }
}
