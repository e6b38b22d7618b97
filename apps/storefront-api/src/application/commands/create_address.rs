use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use storefront_core::domain::checkout::NewAddress;
use tracing::info;

use crate::{
    ApiError, AppState,
    application::{
        middleware::Authenticated,
        scope::{TenantHint, shopping_tenant},
    },
};

// POST /api/addresses (tenant hint required)
pub async fn handle_create_address(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
    Json(payload): Json<NewAddress>,
) -> Result<impl IntoResponse, ApiError> {
    hint.required()?;
    let tenant = shopping_tenant(&state, &ctx.identity, &hint).await?;

    let address = payload.into_address(&tenant.id, ctx.identity.id(), Utc::now())?;
    state.addresses.insert_address(&address).await?;

    info!(
        "Saved address {} for {} at tenant {}",
        address.id,
        ctx.identity.id(),
        tenant.id
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": address }))))
}
