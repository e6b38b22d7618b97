use crate::{
    CoreError,
    domain::{
        identity::{Identity, Role},
        tenant::Tenant,
    },
};
use tracing::warn;

/// Pure access decision. The super-role may act on any tenant; every other role only on its
/// fixed tenant. A missing fixed tenant never grants access.
pub fn can_access_tenant(role: Role, fixed_tenant_id: Option<&str>, target_tenant_id: &str) -> bool {
    match role {
        Role::SuperAdmin => true,
        Role::Admin | Role::Customer | Role::DeliveryPartner => {
            fixed_tenant_id.is_some_and(|fixed| fixed == target_tenant_id)
        }
    }
}

/// Back-office guard: call before any read or mutation of tenant-scoped data.
pub fn ensure_tenant_access(identity: &Identity, target_tenant_id: &str) -> Result<(), CoreError> {
    if can_access_tenant(identity.role(), identity.fixed_tenant_id(), target_tenant_id) {
        Ok(())
    } else {
        warn!(
            "{} {} denied access to tenant {}",
            identity.role(),
            identity.id(),
            target_tenant_id
        );
        Err(CoreError::Forbidden(
            "You do not have access to this tenant".into(),
        ))
    }
}

/// Storefront guard for shopping flows at an already-resolved, active tenant.
///
/// Customers may shop at any active storefront (their visits are recorded as memberships).
/// Staff roles are held to their fixed tenant.
pub fn ensure_storefront_access(identity: &Identity, tenant: &Tenant) -> Result<(), CoreError> {
    match identity.role() {
        Role::SuperAdmin | Role::Customer => Ok(()),
        Role::Admin | Role::DeliveryPartner => ensure_tenant_access(identity, &tenant.id),
    }
}

pub fn require_role(identity: &Identity, allowed: &[Role]) -> Result<(), CoreError> {
    if allowed.contains(&identity.role()) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role {} is not allowed to perform this action",
            identity.role()
        )))
    }
}
