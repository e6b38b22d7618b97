use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use storefront_core::{
    domain::{identity::Role, tenant::NewTenant},
    tenancy::require_role,
};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, AppState, application::middleware::Authenticated};

// POST /api/superadmin/tenants
pub async fn handle_create_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    Json(payload): Json<NewTenant>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;

    let tenant = payload.into_tenant(Uuid::new_v4().to_string(), Utc::now())?;
    // Slug and domain uniqueness is enforced by the store (409 on conflict).
    state.tenant_store.insert(&tenant).await?;

    info!(
        "Tenant {} ({}) created by {}",
        tenant.id,
        tenant.label(),
        ctx.identity.id()
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": tenant }))))
}
