use super::{
    access::ensure_tenant_access,
    directory::{TenantDirectory, TenantRef},
};
use crate::{
    CoreError,
    domain::identity::{Identity, Role},
};
use tracing::{debug, warn};

/// Computes the tenant a request is scoped to.
#[derive(Clone)]
pub struct TenantResolver {
    directory: TenantDirectory,
}

impl TenantResolver {
    pub fn new(directory: TenantDirectory) -> Self {
        Self { directory }
    }

    /// Returns the effective tenant id for `identity`, or `None` when there is nothing to
    /// scope to (empty system).
    ///
    /// Non-super roles always get their fixed tenant; the hint is ignored. The super-role gets
    /// the hinted tenant, then its stored selection, then the earliest-created tenant.
    pub async fn resolve_effective_tenant_id(
        &self,
        identity: &Identity,
        hint: Option<&TenantRef>,
    ) -> Result<Option<String>, CoreError> {
        match identity.role() {
            Role::SuperAdmin => self.resolve_for_super(identity, hint).await,
            Role::Admin | Role::Customer | Role::DeliveryPartner => {
                if let Some(hint) = hint {
                    debug!(
                        "Ignoring tenant hint {} for {} {}",
                        hint,
                        identity.role(),
                        identity.id()
                    );
                }
                Ok(identity.fixed_tenant_id().map(str::to_string))
            }
        }
    }

    async fn resolve_for_super(
        &self,
        identity: &Identity,
        hint: Option<&TenantRef>,
    ) -> Result<Option<String>, CoreError> {
        if let Some(hint) = hint {
            // An explicit selection that does not exist is an error, not a fallback.
            return match self.directory.lookup(hint).await? {
                Some(tenant) => Ok(Some(tenant.id)),
                None => Err(CoreError::NotFound(format!("Tenant with {} not found", hint))),
            };
        }

        if let Some(active) = identity.active_tenant_id() {
            match self.directory.lookup_by_id(active).await? {
                Some(tenant) => return Ok(Some(tenant.id)),
                None => warn!(
                    "Stored tenant selection '{}' for {} no longer exists; using default tenant",
                    active,
                    identity.id()
                ),
            }
        }

        Ok(self.directory.first_created().await?.map(|tenant| tenant.id))
    }

    /// Resolution followed by access validation, in that order. Fails with
    /// `TenantRequired` when nothing can be resolved.
    pub async fn scope(
        &self,
        identity: &Identity,
        hint: Option<&TenantRef>,
    ) -> Result<String, CoreError> {
        let tenant_id = self
            .resolve_effective_tenant_id(identity, hint)
            .await?
            .ok_or_else(|| {
                CoreError::TenantRequired("No tenant available; select or create a tenant first".into())
            })?;
        ensure_tenant_access(identity, &tenant_id)?;
        Ok(tenant_id)
    }
}
