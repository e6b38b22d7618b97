use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use storefront_core::{
    CoreError,
    domain::{checkout::OrderStatus, identity::Role},
    tenancy::{TenantRef, ensure_storefront_access, require_role},
};
use tracing::debug;

use super::{
    middleware::Authenticated,
    scope::{TenantHint, shopping_tenant, storefront_tenant},
};
use crate::{ApiError, AppState};

const BACK_OFFICE_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

// GET /api/tenants/{slug} (public storefront lookup)
pub async fn handle_get_storefront_tenant(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hint = TenantHint(Some(TenantRef::Slug(slug.trim().to_lowercase())));
    let tenant = storefront_tenant(&app_state, &hint).await?;
    Ok(Json(json!({ "data": tenant })))
}

// GET /api/products (public, tenant hint required)
pub async fn handle_list_storefront_products(
    State(app_state): State<AppState>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = storefront_tenant(&app_state, &hint).await?;
    let products: Vec<_> = app_state
        .catalog
        .list_products(&tenant.id)
        .await?
        .into_iter()
        .filter(|product| product.is_available)
        .collect();
    debug!("Listing {} products for storefront {}", products.len(), tenant.label());
    Ok(Json(json!({ "data": products })))
}

// GET /api/tenants (super-role tenant picker: active tenants, oldest first)
pub async fn handle_list_active_tenants(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;
    let tenants: Vec<_> = app_state
        .tenant_store
        .list()
        .await?
        .into_iter()
        .filter(|tenant| tenant.is_active)
        .collect();
    Ok(Json(json!({ "data": tenants })))
}

// GET /api/superadmin/tenants (every tenant, newest first)
pub async fn handle_list_all_tenants(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;
    let mut tenants = app_state.tenant_store.list().await?;
    tenants.reverse();
    Ok(Json(json!({ "data": tenants })))
}

// GET /api/tenant/current
pub async fn handle_current_tenant(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    let tenant_id = app_state
        .resolver
        .scope(&ctx.identity, hint.reference())
        .await?;
    let tenant = app_state
        .directory
        .lookup_by_id(&tenant_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Tenant with ID {} not found", tenant_id)))?;
    Ok(Json(json!({
        "data": {
            "tenant": tenant,
            "role": ctx.identity.role(),
            "can_switch_tenant": ctx.identity.role().is_super(),
        }
    })))
}

// GET /api/admin/products
pub async fn handle_list_admin_products(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, BACK_OFFICE_ROLES)?;
    let tenant_id = app_state
        .resolver
        .scope(&ctx.identity, hint.reference())
        .await?;
    let products = app_state.catalog.list_products(&tenant_id).await?;
    Ok(Json(json!({ "data": products, "tenant_id": tenant_id })))
}

// GET /api/admin/memberships
pub async fn handle_list_memberships(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, BACK_OFFICE_ROLES)?;
    let tenant_id = app_state
        .resolver
        .scope(&ctx.identity, hint.reference())
        .await?;
    let memberships = app_state.membership_store.list_for_tenant(&tenant_id).await?;
    Ok(Json(json!({ "data": memberships, "tenant_id": tenant_id })))
}

// GET /api/cart
pub async fn handle_get_cart(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = shopping_tenant(&app_state, &ctx.identity, &hint).await?;
    let items = app_state
        .catalog
        .list_cart(&tenant.id, ctx.identity.id())
        .await?;
    Ok(Json(json!({ "data": items, "tenant_id": tenant.id })))
}

// GET /api/addresses (tenant hint required)
pub async fn handle_list_addresses(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
) -> Result<impl IntoResponse, ApiError> {
    hint.required()?;
    let tenant = shopping_tenant(&app_state, &ctx.identity, &hint).await?;
    let addresses = app_state
        .addresses
        .list_addresses(&tenant.id, ctx.identity.id())
        .await?;
    Ok(Json(json!({ "data": addresses, "tenant_id": tenant.id })))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

// GET /api/orders
//
// Back-office roles see every order at the tenant; customers and couriers only their own.
pub async fn handle_list_orders(
    State(app_state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant_id = match hint.reference() {
        Some(reference) => {
            let tenant = app_state
                .directory
                .lookup(reference)
                .await?
                .ok_or_else(|| CoreError::NotFound("Tenant not found".into()))?;
            ensure_storefront_access(&ctx.identity, &tenant)?;
            tenant.id
        }
        None => app_state.resolver.scope(&ctx.identity, None).await?,
    };
    let status = filter
        .status
        .as_deref()
        .filter(|status| !status.trim().is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let owner = match ctx.identity.role() {
        Role::Admin | Role::SuperAdmin => None,
        Role::Customer | Role::DeliveryPartner => Some(ctx.identity.id()),
    };

    let orders = app_state.orders.list_orders(&tenant_id, owner, status).await?;
    debug!("Listing {} orders at tenant {}", orders.len(), tenant_id);
    Ok(Json(json!({ "data": orders, "tenant_id": tenant_id })))
}
