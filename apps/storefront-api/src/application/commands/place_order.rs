use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use storefront_core::{CoreError, domain::checkout::Order};
use tracing::info;

use crate::{
    ApiError, AppState,
    application::{
        middleware::Authenticated,
        scope::{TenantHint, shopping_tenant},
    },
};

#[derive(Deserialize, Debug)]
pub struct PlaceOrderDto {
    #[serde(alias = "addressId")]
    pub address_id: String,
}

// POST /api/orders (checks out the caller's cart at the tenant)
pub async fn handle_place_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
    Json(payload): Json<PlaceOrderDto>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = shopping_tenant(&state, &ctx.identity, &hint).await?;
    let user_id = ctx.identity.id();

    let address = state
        .addresses
        .find_address(&tenant.id, user_id, &payload.address_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Address not found".into()))?;

    let cart = state.catalog.list_cart(&tenant.id, user_id).await?;
    let mut lines = Vec::with_capacity(cart.len());
    for item in cart {
        let product = state
            .catalog
            .find_product(&tenant.id, &item.product_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!("Product not available (ID: {})", item.product_id))
            })?;
        lines.push((item, product));
    }

    let order = Order::from_cart(&address, &lines, Utc::now())?;
    state.orders.place_order(&order).await?;

    info!(
        "Order {} placed by {} at tenant {} ({} lines)",
        order.order_number,
        user_id,
        tenant.id,
        order.items.len()
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": order }))))
}
