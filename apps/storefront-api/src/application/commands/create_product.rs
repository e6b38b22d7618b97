use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use storefront_core::{
    domain::{catalog::NewProduct, identity::Role},
    tenancy::{ensure_tenant_access, require_role},
};
use tracing::info;

use crate::{
    ApiError, AppState,
    application::{middleware::Authenticated, scope::TenantHint},
};

// POST /api/admin/products
pub async fn handle_create_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::Admin, Role::SuperAdmin])?;

    let tenant_id = state.resolver.scope(&ctx.identity, hint.reference()).await?;
    let product = payload.into_product(&tenant_id, Utc::now())?;
    // Re-checked against the record about to be written.
    ensure_tenant_access(&ctx.identity, &product.tenant_id)?;
    state.catalog.insert_product(&product).await?;

    info!(
        "Product {} created in tenant {} by {}",
        product.id,
        tenant_id,
        ctx.identity.id()
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": product }))))
}
