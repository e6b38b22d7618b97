use super::catalog::{CartItem, Product};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// --- Records ---

/// Delivery address a customer keeps at one storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(CheckoutError::InvalidInput(format!(
                "Unknown order status: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i32,
    /// Unit price at the time the order was placed.
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub address_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

// --- Errors ---

#[derive(thiserror::Error, Debug)]
pub enum CheckoutError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Product not available (ID: {0})")]
    ProductUnavailable(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
}

// --- Commands ---

/// Payload for saving an address. Accepts both snake_case and camelCase keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, alias = "addressLine1")]
    pub address_line1: String,
    #[serde(default, alias = "addressLine2")]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default, alias = "isDefault")]
    pub is_default: bool,
}

impl NewAddress {
    pub fn into_address(
        self,
        tenant_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Address, CheckoutError> {
        let required = [
            self.name.trim(),
            self.phone.trim(),
            self.address_line1.trim(),
            self.city.trim(),
            self.state.trim(),
            self.pincode.trim(),
        ];
        if required.iter().any(|field| field.is_empty()) {
            return Err(CheckoutError::InvalidInput("Missing required fields".into()));
        }
        Ok(Address {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self
                .address_line2
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
            is_default: self.is_default,
            created_at: now,
        })
    }
}

impl Order {
    /// Turns the cart lines of one user at one tenant into a pending order shipped to
    /// `address`. Every line is priced at the product's current price and re-checked
    /// against availability and stock.
    pub fn from_cart(
        address: &Address,
        lines: &[(CartItem, Product)],
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        let mut total_cents: i64 = 0;
        for (line, product) in lines {
            if !product.is_available {
                return Err(CheckoutError::ProductUnavailable(product.id.clone()));
            }
            if line.quantity > product.stock {
                return Err(CheckoutError::InsufficientStock(format!(
                    "Only {} of {} left",
                    product.stock, product.name
                )));
            }
            total_cents = product
                .price_cents
                .checked_mul(i64::from(line.quantity))
                .and_then(|line_total| total_cents.checked_add(line_total))
                .ok_or_else(|| CheckoutError::InvalidInput("Order total is too large".into()))?;
            items.push(OrderItem {
                product_id: product.id.clone(),
                quantity: line.quantity,
                price_cents: product.price_cents,
            });
        }

        let id = Uuid::new_v4();
        Ok(Order {
            order_number: format!(
                "ORD-{}-{}",
                now.format("%Y%m%d%H%M%S"),
                id.simple().to_string()[..8].to_ascii_uppercase()
            ),
            id: id.to_string(),
            tenant_id: address.tenant_id.clone(),
            user_id: address.user_id.clone(),
            address_id: address.id.clone(),
            status: OrderStatus::Pending,
            total_cents,
            items,
            created_at: now,
        })
    }
}
