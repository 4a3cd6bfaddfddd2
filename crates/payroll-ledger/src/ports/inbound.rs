//! # Inbound Ports (Driving Ports)
//!
//! Read-only access to the derived ledgers for a presentation layer.

use shared_types::{Address, Timestamp};

use crate::domain::{
    Accrual, AutoEarnEntry, EmployeeEntry, JoinedViewEntry, LedgerError, OrganizationEntry,
};

/// Query API over the derived ledgers.
pub trait LedgerQueryApi {
    fn employee(
        &self,
        organization: Address,
        employee: Address,
    ) -> Result<Option<EmployeeEntry>, LedgerError>;

    fn organization(&self, organization: Address) -> Result<Option<OrganizationEntry>, LedgerError>;

    /// Organization fields as seen from one employee.
    fn joined_view(
        &self,
        employee: Address,
        organization: Address,
    ) -> Result<Option<JoinedViewEntry>, LedgerError>;

    fn auto_earn(
        &self,
        organization: Address,
        employee: Address,
        protocol: Address,
    ) -> Result<Option<AutoEarnEntry>, LedgerError>;

    /// Employee rows of every member of `organization`.
    fn employees_of(&self, organization: Address) -> Result<Vec<EmployeeEntry>, LedgerError>;

    /// Run the streaming calculator at `at` without touching stored state.
    ///
    /// Returns the zero accrual for an unknown or non-streaming employee.
    fn projected_balance(
        &self,
        organization: Address,
        employee: Address,
        at: Timestamp,
    ) -> Result<Accrual, LedgerError>;
}
