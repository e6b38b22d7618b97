use async_trait::async_trait;
use std::error::Error as StdError;

// Declare modules
pub mod adapters;
pub mod domain;
pub mod tenancy;

use domain::catalog::{CartItem, Product};
use domain::checkout::{Address, Order, OrderStatus};
use domain::membership::Membership;
use domain::tenant::Tenant;

// Common error type for the core library. Route handlers map these onto HTTP statuses.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Tenant is not active: {0}")]
    Inactive(String),
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Tenant required: {0}")]
    TenantRequired(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] Box<dyn StdError + Send + Sync>),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for failures a caller may retry (store or cache trouble), as opposed to
    /// resolution and access-control outcomes.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Infrastructure(_) | CoreError::Unavailable(_))
    }
}

// Allows '?' to convert domain errors into CoreError in handlers
impl From<domain::tenant::TenantError> for CoreError {
    fn from(err: domain::tenant::TenantError) -> Self {
        match err {
            domain::tenant::TenantError::InvalidInput(msg)
            | domain::tenant::TenantError::InvalidSlug(msg) => CoreError::Validation(msg),
        }
    }
}

impl From<domain::identity::IdentityError> for CoreError {
    fn from(err: domain::identity::IdentityError) -> Self {
        // Any malformed principal is treated as no principal at all.
        CoreError::Unauthenticated(err.to_string())
    }
}

impl From<domain::catalog::CatalogError> for CoreError {
    fn from(err: domain::catalog::CatalogError) -> Self {
        match err {
            domain::catalog::CatalogError::ProductUnavailable(id) => {
                CoreError::NotFound(format!("Product not available: {}", id))
            }
            domain::catalog::CatalogError::InvalidInput(msg)
            | domain::catalog::CatalogError::InsufficientStock(msg) => CoreError::Validation(msg),
        }
    }
}

impl From<domain::checkout::CheckoutError> for CoreError {
    fn from(err: domain::checkout::CheckoutError) -> Self {
        match err {
            domain::checkout::CheckoutError::ProductUnavailable(id) => {
                CoreError::NotFound(format!("Product not available: {}", id))
            }
            domain::checkout::CheckoutError::EmptyCart => {
                CoreError::Validation("Cart is empty".into())
            }
            domain::checkout::CheckoutError::InvalidInput(msg)
            | domain::checkout::CheckoutError::InsufficientStock(msg) => CoreError::Validation(msg),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

// Port for caching data
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;
    async fn set(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>)
    -> Result<(), CoreError>;
    async fn delete(&self, key: &str) -> Result<(), CoreError>;
}

// Port for the tenant table
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, CoreError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError>;
    /// The tenant with the smallest `created_at` (ties broken by id), if any.
    async fn first_created(&self) -> Result<Option<Tenant>, CoreError>;
    /// All tenants, oldest first.
    async fn list(&self) -> Result<Vec<Tenant>, CoreError>;
    /// Fails with `CoreError::Conflict` when the slug or domain is already taken.
    async fn insert(&self, tenant: &Tenant) -> Result<(), CoreError>;
    /// Fails with `CoreError::NotFound` for an unknown id and `CoreError::Conflict`
    /// when the new slug or domain belongs to another tenant.
    async fn update(&self, tenant: &Tenant) -> Result<(), CoreError>;
}

// Port for user-tenant links
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Inserts the membership unless one already exists for (user_id, tenant_id).
    /// Returns true when a row was created.
    async fn upsert(&self, membership: &Membership) -> Result<bool, CoreError>;
    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Membership>, CoreError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Membership>, CoreError>;
}

// Port for tenant-scoped catalog data. Every call carries the tenant it is scoped to.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, CoreError>;
    async fn find_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> Result<Option<Product>, CoreError>;
    async fn insert_product(&self, product: &Product) -> Result<(), CoreError>;
    async fn list_cart(&self, tenant_id: &str, user_id: &str) -> Result<Vec<CartItem>, CoreError>;
    async fn find_cart_item(
        &self,
        tenant_id: &str,
        user_id: &str,
        product_id: &str,
    ) -> Result<Option<CartItem>, CoreError>;
    /// Inserts or replaces the item keyed by (user_id, product_id, tenant_id).
    async fn save_cart_item(&self, item: &CartItem) -> Result<(), CoreError>;
}

// Port for customer addresses, scoped like the cart to (tenant_id, user_id).
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Default address first, then newest first.
    async fn list_addresses(&self, tenant_id: &str, user_id: &str)
    -> Result<Vec<Address>, CoreError>;
    async fn find_address(
        &self,
        tenant_id: &str,
        user_id: &str,
        address_id: &str,
    ) -> Result<Option<Address>, CoreError>;
    /// A default address clears the flag on the user's other addresses at the same tenant.
    async fn insert_address(&self, address: &Address) -> Result<(), CoreError>;
}

// Port for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order and removes the ordered products from the user's cart at that tenant.
    async fn place_order(&self, order: &Order) -> Result<(), CoreError>;
    /// Newest first. `user_id` narrows the list to one customer.
    async fn list_orders(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, CoreError>;
}
