//! Where a request says which tenant it is about, and how route handlers turn that into a
//! tenant they are allowed to touch.

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, Uri, request::Parts},
};
use serde::Deserialize;
use storefront_core::{
    CoreError,
    domain::{identity::Identity, tenant::Tenant},
    tenancy::{TenantRef, ensure_storefront_access},
};

use crate::{ApiError, AppState};

pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const TENANT_SLUG_HEADER: &str = "x-tenant-slug";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HintQuery {
    tenant_id: Option<String>,
    tenant_slug: Option<String>,
}

/// The tenant a request points at, if any. Query parameters win over headers and an id wins
/// over a slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantHint(pub Option<TenantRef>);

impl TenantHint {
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Result<Self, CoreError> {
        let query = match uri.query() {
            Some(_) => Query::<HintQuery>::try_from_uri(uri)
                .map(|Query(query)| query)
                .map_err(|e| CoreError::Validation(format!("Invalid query string: {}", e)))?,
            None => HintQuery::default(),
        };
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let candidates = [
            query.tenant_id.map(TenantRef::Id),
            query.tenant_slug.map(TenantRef::Slug),
            header(TENANT_ID_HEADER).map(TenantRef::Id),
            header(TENANT_SLUG_HEADER).map(TenantRef::Slug),
        ];
        let reference = candidates.into_iter().flatten().find_map(|reference| match reference {
            TenantRef::Id(id) if !id.trim().is_empty() => Some(TenantRef::Id(id.trim().to_string())),
            TenantRef::Slug(slug) if !slug.trim().is_empty() => {
                Some(TenantRef::Slug(slug.trim().to_lowercase()))
            }
            _ => None,
        });
        Ok(Self(reference))
    }

    pub fn reference(&self) -> Option<&TenantRef> {
        self.0.as_ref()
    }

    /// Storefront routes cannot fall back to anything; they need to be told.
    pub fn required(&self) -> Result<&TenantRef, CoreError> {
        self.0
            .as_ref()
            .ok_or_else(|| CoreError::TenantRequired("Tenant slug is required".into()))
    }
}

impl<S> FromRequestParts<S> for TenantHint
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request(&parts.uri, &parts.headers)?)
    }
}

/// An active tenant looked up from an explicit hint. Unknown is `NotFound`, never a fallback.
pub async fn storefront_tenant(state: &AppState, hint: &TenantHint) -> Result<Tenant, CoreError> {
    let reference = hint.required()?;
    let tenant = state
        .directory
        .lookup(reference)
        .await?
        .ok_or_else(|| CoreError::NotFound("Tenant not found".into()))?;
    tenant.ensure_active()?;
    Ok(tenant)
}

/// Tenant for a signed-in shopping flow (cart and the like).
///
/// With a hint the caller shops at that storefront, subject to
/// [`ensure_storefront_access`]. Without one the regular resolver decides.
/// In both cases the tenant must be active.
pub async fn shopping_tenant(
    state: &AppState,
    identity: &Identity,
    hint: &TenantHint,
) -> Result<Tenant, CoreError> {
    let tenant = match hint.reference() {
        Some(_) => storefront_tenant(state, hint).await?,
        None => {
            let tenant_id = state.resolver.scope(identity, None).await?;
            let tenant = state
                .directory
                .lookup_by_id(&tenant_id)
                .await?
                .ok_or_else(|| CoreError::NotFound("Tenant not found".into()))?;
            tenant.ensure_active()?;
            tenant
        }
    };
    ensure_storefront_access(identity, &tenant)?;
    state
        .memberships
        .ensure_membership(identity.id(), &tenant.id, identity.role())
        .await;
    Ok(tenant)
}
