use axum::{
    Json,
    extract::{Extension, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use storefront_core::{CoreError, domain::identity::Role, tenancy::require_role};
use tracing::info;

use crate::{ApiError, AppState, application::middleware::Authenticated};

#[derive(Deserialize, Debug)]
pub struct SetActiveTenantDto {
    #[serde(default, alias = "tenantId")]
    pub tenant_id: Option<String>,
}

// POST /api/tenant/set-active
pub async fn handle_set_active_tenant(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    Json(payload): Json<SetActiveTenantDto>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;

    let selection = match payload.tenant_id.filter(|id| !id.trim().is_empty()) {
        Some(tenant_id) => {
            let tenant = state
                .directory
                .lookup_by_id(tenant_id.trim())
                .await?
                .ok_or_else(|| {
                    CoreError::NotFound(format!("Tenant with ID {} not found", tenant_id))
                })?;
            Some(tenant.id)
        }
        None => None,
    };

    let updated = state
        .sessions
        .select_active_tenant(&ctx.token, &ctx.identity, selection)
        .await?;
    info!(
        "{} switched active tenant to {:?}",
        updated.id(),
        updated.active_tenant_id()
    );
    Ok(Json(json!({
        "data": { "active_tenant_id": updated.active_tenant_id() }
    })))
}
