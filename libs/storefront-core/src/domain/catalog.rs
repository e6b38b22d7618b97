use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Records ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Price in minor currency units.
    pub price_cents: i64,
    pub stock: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Product not available (ID: {0})")]
    ProductUnavailable(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
}

// --- Commands ---

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub price_cents: i64,
    pub stock: i32,
    #[serde(default)]
    pub is_available: Option<bool>,
}

impl NewProduct {
    /// Builds a product owned by `tenant_id`. The tenant comes from resolution, never from the payload.
    pub fn into_product(
        self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Product, CatalogError> {
        let name = self.name.trim().to_string();
        let category = self.category.trim().to_string();
        if name.is_empty() || category.is_empty() {
            return Err(CatalogError::InvalidInput("Missing required fields".into()));
        }
        if self.price_cents < 0 {
            return Err(CatalogError::InvalidInput(
                "Price cannot be negative".into(),
            ));
        }
        if self.stock < 0 {
            return Err(CatalogError::InvalidInput(
                "Stock cannot be negative".into(),
            ));
        }
        Ok(Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name,
            description: self.description.unwrap_or_default(),
            category,
            price_cents: self.price_cents,
            stock: self.stock,
            is_available: self.is_available.unwrap_or(true),
            created_at: now,
        })
    }
}

impl CartItem {
    /// Adds `quantity` of `product` to the user's cart, merging with the existing line.
    /// The resulting line may not exceed the product's stock.
    pub fn add(
        existing: Option<CartItem>,
        product: &Product,
        user_id: &str,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<CartItem, CatalogError> {
        if quantity < 1 {
            return Err(CatalogError::InvalidInput(
                "Quantity must be at least 1".into(),
            ));
        }
        if !product.is_available {
            return Err(CatalogError::ProductUnavailable(product.id.clone()));
        }
        let mut item = existing.unwrap_or_else(|| CartItem {
            id: Uuid::new_v4().to_string(),
            tenant_id: product.tenant_id.clone(),
            user_id: user_id.to_string(),
            product_id: product.id.clone(),
            quantity: 0,
            created_at: now,
            updated_at: now,
        });
        let next = item.quantity.saturating_add(quantity);
        if next > product.stock {
            return Err(CatalogError::InsufficientStock(
                "Not enough stock available".into(),
            ));
        }
        item.quantity = next;
        item.updated_at = now;
        Ok(item)
    }
}
