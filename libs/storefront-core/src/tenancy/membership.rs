use crate::{
    MembershipStore,
    domain::{identity::Role, membership::Membership},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records that a customer has interacted with a storefront.
#[derive(Clone)]
pub struct MembershipEnsurer {
    store: Arc<dyn MembershipStore>,
}

impl MembershipEnsurer {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// Idempotent and best-effort: only customers get a membership, and a failed write is
    /// logged and swallowed so it never blocks the request that triggered it.
    pub async fn ensure_membership(&self, user_id: &str, tenant_id: &str, role: Role) {
        match role {
            Role::Customer => {}
            Role::SuperAdmin | Role::Admin | Role::DeliveryPartner => return,
        }

        match self
            .store
            .upsert(&Membership::customer(user_id, tenant_id))
            .await
        {
            Ok(true) => info!("Recorded membership of {} in tenant {}", user_id, tenant_id),
            Ok(false) => debug!("Membership of {} in tenant {} already exists", user_id, tenant_id),
            Err(e) => warn!(
                "Failed to record membership of {} in tenant {}: {}",
                user_id, tenant_id, e
            ),
        }
    }
}
