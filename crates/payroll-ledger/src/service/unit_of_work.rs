//! Per-event unit of work.
//!
//! A [`LedgerTx`] stages every write of one event in a [`WriteBatch`]. Reads
//! check the batch before the store, so a handler always sees its own
//! earlier writes and never acts on a stale copy. Nothing reaches the store
//! until [`LedgerTx::commit`]; dropping the transaction discards the batch.

use std::collections::BTreeSet;

use shared_types::Address;

use crate::domain::{
    AutoEarnEntry, AutoEarnKey, EmployeeEntry, EmployeeKey, JoinedViewEntry, JoinedViewKey,
    LedgerError, OrganizationEntry,
};
use crate::ports::{LedgerStore, WriteBatch};

pub struct LedgerTx<'a> {
    store: &'a dyn LedgerStore,
    batch: WriteBatch,
}

impl<'a> LedgerTx<'a> {
    pub fn begin(store: &'a dyn LedgerStore) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
        }
    }

    pub fn employee(&self, key: &EmployeeKey) -> Result<Option<EmployeeEntry>, LedgerError> {
        match self.batch.employees.get(key) {
            Some(staged) => Ok(Some(staged.clone())),
            None => self.store.employee(key),
        }
    }

    pub fn put_employee(&mut self, entry: EmployeeEntry) {
        self.batch.employees.insert(entry.key(), entry);
    }

    pub fn organization(
        &self,
        organization: &Address,
    ) -> Result<Option<OrganizationEntry>, LedgerError> {
        match self.batch.organizations.get(organization) {
            Some(staged) => Ok(Some(staged.clone())),
            None => self.store.organization(organization),
        }
    }

    pub fn put_organization(&mut self, entry: OrganizationEntry) {
        self.batch.organizations.insert(entry.organization, entry);
    }

    pub fn joined_view(&self, key: &JoinedViewKey) -> Result<Option<JoinedViewEntry>, LedgerError> {
        match self.batch.joined_views.get(key) {
            Some(staged) => Ok(Some(staged.clone())),
            None => self.store.joined_view(key),
        }
    }

    pub fn put_joined_view(&mut self, entry: JoinedViewEntry) {
        self.batch.joined_views.insert(entry.key(), entry);
    }

    pub fn auto_earn(&self, key: &AutoEarnKey) -> Result<Option<AutoEarnEntry>, LedgerError> {
        match self.batch.auto_earn.get(key) {
            Some(staged) => Ok(Some(staged.clone())),
            None => self.store.auto_earn(key),
        }
    }

    pub fn put_auto_earn(&mut self, entry: AutoEarnEntry) {
        self.batch.auto_earn.insert(entry.key(), entry);
    }

    /// All Auto-Earn entries of one employee, staged versions first.
    pub fn auto_earn_of(&self, employee: &EmployeeKey) -> Result<Vec<AutoEarnEntry>, LedgerError> {
        let mut entries: Vec<AutoEarnEntry> = self
            .store
            .auto_earn_of(employee)?
            .into_iter()
            .filter(|stored| !self.batch.auto_earn.contains_key(&stored.key()))
            .collect();
        entries.extend(
            self.batch
                .auto_earn
                .values()
                .filter(|staged| staged.employee_key() == *employee)
                .cloned(),
        );
        Ok(entries)
    }

    pub fn add_member(&mut self, organization: Address, employee: Address) {
        self.batch.members.insert((organization, employee));
    }

    /// Members of `organization`, including ones staged by this event.
    pub fn members(&self, organization: &Address) -> Result<Vec<Address>, LedgerError> {
        let mut members: BTreeSet<Address> = self.store.members(organization)?.into_iter().collect();
        members.extend(
            self.batch
                .members
                .iter()
                .filter(|(org, _)| org == organization)
                .map(|(_, employee)| *employee),
        );
        Ok(members.into_iter().collect())
    }

    /// Rows staged so far.
    pub fn staged(&self) -> &WriteBatch {
        &self.batch
    }

    /// Write the batch to the store. Returns the number of rows written.
    pub fn commit(self) -> Result<usize, LedgerError> {
        let written = self.batch.len();
        if written > 0 {
            self.store.commit(self.batch)?;
        }
        Ok(written)
    }
}
