use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use storefront_core::{
    CoreError,
    domain::identity::{Identity, Role},
    tenancy::require_role,
};
use tracing::info;

use crate::{ApiError, AppState, application::middleware::Authenticated};

#[derive(Deserialize, Debug)]
pub struct IssueSessionDto {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

// POST /api/superadmin/sessions
pub async fn handle_issue_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    Json(payload): Json<IssueSessionDto>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&ctx.identity, &[Role::SuperAdmin])?;

    let identity = Identity::new(payload.user_id, payload.role, payload.tenant_id, None)
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    if let Some(tenant_id) = identity.fixed_tenant_id() {
        if state.directory.lookup_by_id(tenant_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Tenant with ID {} not found", tenant_id)).into());
        }
    }

    let token = state.sessions.issue(&identity).await?;
    info!(
        "{} issued a {} session for {}",
        ctx.identity.id(),
        identity.role(),
        identity.id()
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "token": token,
                "user_id": identity.id(),
                "role": identity.role(),
                "tenant_id": identity.fixed_tenant_id(),
            }
        })),
    ))
}

// DELETE /api/session
pub async fn handle_revoke_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
) -> Result<StatusCode, ApiError> {
    state.sessions.revoke(&ctx.token).await?;
    info!("Session of {} revoked", ctx.identity.id());
    Ok(StatusCode::NO_CONTENT)
}
