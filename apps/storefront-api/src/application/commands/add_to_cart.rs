use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use storefront_core::{CoreError, domain::catalog::CartItem};
use tracing::debug;

use crate::{
    ApiError, AppState,
    application::{
        middleware::Authenticated,
        scope::{TenantHint, shopping_tenant},
    },
};

fn default_quantity() -> i32 {
    1
}

#[derive(Deserialize, Debug)]
pub struct AddToCartDto {
    #[serde(alias = "productId")]
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

// POST /api/cart
pub async fn handle_add_to_cart(
    State(state): State<AppState>,
    Extension(ctx): Extension<Authenticated>,
    hint: TenantHint,
    Json(payload): Json<AddToCartDto>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = shopping_tenant(&state, &ctx.identity, &hint).await?;
    let user_id = ctx.identity.id();

    let product = state
        .catalog
        .find_product(&tenant.id, &payload.product_id)
        .await?
        .ok_or_else(|| CoreError::NotFound("Product not found".into()))?;
    let existing = state
        .catalog
        .find_cart_item(&tenant.id, user_id, &product.id)
        .await?;
    let item = CartItem::add(existing, &product, user_id, payload.quantity, Utc::now())?;
    state.catalog.save_cart_item(&item).await?;

    debug!(
        "Cart of {} in tenant {} now holds {} x {}",
        user_id, tenant.id, item.quantity, product.id
    );
    Ok((StatusCode::CREATED, Json(json!({ "data": item }))))
}
