//! Read-side service over a [`LedgerStore`].

use std::sync::Arc;

use shared_types::{Address, Timestamp};

use crate::domain::{
    compute_accrual, Accrual, AutoEarnEntry, AutoEarnKey, EmployeeEntry, EmployeeKey,
    JoinedViewEntry, JoinedViewKey, LedgerConfig, LedgerError, OrganizationEntry,
};
use crate::ports::{LedgerQueryApi, LedgerStore};

pub struct LedgerQueryService {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
}

impl LedgerQueryService {
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }
}

impl LedgerQueryApi for LedgerQueryService {
    fn employee(
        &self,
        organization: Address,
        employee: Address,
    ) -> Result<Option<EmployeeEntry>, LedgerError> {
        self.store.employee(&EmployeeKey::new(organization, employee))
    }

    fn organization(&self, organization: Address) -> Result<Option<OrganizationEntry>, LedgerError> {
        self.store.organization(&organization)
    }

    fn joined_view(
        &self,
        employee: Address,
        organization: Address,
    ) -> Result<Option<JoinedViewEntry>, LedgerError> {
        self.store.joined_view(&JoinedViewKey::new(employee, organization))
    }

    fn auto_earn(
        &self,
        organization: Address,
        employee: Address,
        protocol: Address,
    ) -> Result<Option<AutoEarnEntry>, LedgerError> {
        self.store
            .auto_earn(&AutoEarnKey::new(organization, employee, protocol))
    }

    fn employees_of(&self, organization: Address) -> Result<Vec<EmployeeEntry>, LedgerError> {
        let mut employees = Vec::new();
        for member in self.store.members(&organization)? {
            if let Some(entry) = self.store.employee(&EmployeeKey::new(organization, member))? {
                employees.push(entry);
            }
        }
        Ok(employees)
    }

    fn projected_balance(
        &self,
        organization: Address,
        employee: Address,
        at: Timestamp,
    ) -> Result<Accrual, LedgerError> {
        let entry = self.employee(organization, employee)?;
        let org = self.store.organization(&organization)?;
        compute_accrual(
            entry.as_ref(),
            org.as_ref(),
            at,
            self.config.default_period_secs,
        )
    }
}
