use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use storefront_core::{
    CoreError,
    domain::{identity::Role, tenant::TenantUpdate},
    tenancy::require_role,
};
use tracing::info;

use crate::{ApiError, AppState, application::middleware::Authenticated};

// PATCH /api/superadmin/tenants/{id}
pub async fn handle_update_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<TenantUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;

    // Read from the store, not the directory: the update must start from the current row.
    let current = state
        .tenant_store
        .find_by_id(&tenant_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Tenant with ID {} not found", tenant_id)))?;
    let updated = payload.apply(&current, Utc::now())?;
    state.tenant_store.update(&updated).await?;

    // Both the old and the new slug may be cached.
    state.directory.invalidate(&current).await;
    state.directory.invalidate(&updated).await;

    info!(
        "Tenant {} updated by {} (active: {})",
        updated.id,
        ctx.identity.id(),
        updated.is_active
    );
    Ok(Json(json!({ "data": updated })))
}
