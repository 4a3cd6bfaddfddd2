//! Joined View maintenance.
//!
//! Each (employee, organization) row mirrors the organization's public
//! fields. A handler that changes an organization calls [`fan_out`] (or
//! [`refresh`] for the one employee it touched) after its last
//! organization write, so the copy is taken from the final state.

use shared_types::Address;
use tracing::debug;

use super::EventScope;
use crate::domain::{JoinedViewEntry, JoinedViewKey, LedgerError};

/// Re-copy `organization` into `employee`'s view row. Skipped when the
/// organization is unknown.
pub fn refresh(
    scope: &mut EventScope<'_>,
    employee: Address,
    organization: Address,
) -> Result<bool, LedgerError> {
    let Some(org) = scope.tx.organization(&organization)? else {
        debug!(
            organization = %organization,
            employee = %employee,
            "Organization not found; joined view not refreshed"
        );
        return Ok(false);
    };
    let key = JoinedViewKey::new(employee, organization);
    let previous = scope.tx.joined_view(&key)?;
    let entry = JoinedViewEntry::replicate(employee, &org, previous.as_ref(), &scope.ctx);
    scope.tx.put_joined_view(entry);
    Ok(true)
}

/// Refresh the view row of every member. Returns the number of rows written.
pub fn fan_out(scope: &mut EventScope<'_>, organization: Address) -> Result<usize, LedgerError> {
    let Some(org) = scope.tx.organization(&organization)? else {
        debug!(organization = %organization, "Organization not found; fan-out skipped");
        return Ok(0);
    };
    let members = scope.tx.members(&organization)?;
    for employee in &members {
        let key = JoinedViewKey::new(*employee, organization);
        let previous = scope.tx.joined_view(&key)?;
        let entry = JoinedViewEntry::replicate(*employee, &org, previous.as_ref(), &scope.ctx);
        scope.tx.put_joined_view(entry);
    }
    debug!(
        organization = %organization,
        members = members.len(),
        "Joined views refreshed"
    );
    Ok(members.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::{EventContext, LedgerConfig, OrganizationEntry};
    use crate::metrics::NoOpMetrics;
    use crate::service::LedgerTx;
    use shared_types::{Amount, TxHash};

    const ORG: Address = Address::repeat_byte(0x0a);

    #[test]
    fn test_fan_out_covers_every_member() {
        let store = InMemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let mut scope = EventScope::new(
            LedgerTx::begin(&store),
            EventContext::new(3, 300, TxHash::repeat_byte(3)),
            &config,
            &NoOpMetrics,
        );
        let mut org = OrganizationEntry::new(ORG, 60, &scope.ctx);
        org.total_deposits = Amount::from(42u64);
        scope.tx.put_organization(org.clone());
        scope.tx.add_member(ORG, Address::repeat_byte(1));
        scope.tx.add_member(ORG, Address::repeat_byte(2));

        assert_eq!(fan_out(&mut scope, ORG).unwrap(), 2);
        for employee in [Address::repeat_byte(1), Address::repeat_byte(2)] {
            let view = scope
                .tx
                .joined_view(&JoinedViewKey::new(employee, ORG))
                .unwrap()
                .unwrap();
            assert!(view.mirrors(&org));
            assert_eq!(view.last_updated, 300);
        }
    }

    #[test]
    fn test_refresh_skips_unknown_organization() {
        let store = InMemoryLedgerStore::new();
        let config = LedgerConfig::default();
        let mut scope = EventScope::new(
            LedgerTx::begin(&store),
            EventContext::new(1, 1, TxHash::ZERO),
            &config,
            &NoOpMetrics,
        );
        assert!(!refresh(&mut scope, Address::repeat_byte(1), ORG).unwrap());
        assert_eq!(fan_out(&mut scope, ORG).unwrap(), 0);
        assert!(scope.tx.staged().is_empty());
    }
}
