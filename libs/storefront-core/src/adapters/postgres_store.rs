use crate::{
    AddressStore, CatalogStore, CoreError, MembershipStore, OrderStore, TenantStore,
    domain::{
        catalog::{CartItem, Product},
        checkout::{Address, Order, OrderItem, OrderStatus},
        identity::Role,
        membership::Membership,
        tenant::Tenant,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, migrate::Migrator};
use std::collections::HashMap;

/// Schema for every table this adapter touches.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const TENANT_COLUMNS: &str = "id, slug, domain, name, description, logo, contact_email, \
                              contact_phone, is_active, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, description, category, price_cents, stock, is_available, created_at";
const CART_COLUMNS: &str = "id, tenant_id, user_id, product_id, quantity, created_at, updated_at";
const ADDRESS_COLUMNS: &str = "id, tenant_id, user_id, name, phone, address_line1, address_line2, \
                               city, state, pincode, is_default, created_at";
const ORDER_COLUMNS: &str =
    "id, tenant_id, user_id, address_id, order_number, status, total_cents, created_at";

#[derive(sqlx::FromRow, Debug)]
struct TenantRow {
    id: String,
    slug: Option<String>,
    domain: Option<String>,
    name: String,
    description: Option<String>,
    logo: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            slug: row.slug,
            domain: row.domain,
            name: row.name,
            description: row.description,
            logo: row.logo,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct MembershipRow {
    user_id: String,
    tenant_id: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = CoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|e| {
            CoreError::Serialization(format!("Stored membership has {}", e))
        })?;
        Ok(Membership {
            user_id: row.user_id,
            tenant_id: row.tenant_id,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow, Debug)]
struct ProductRow {
    id: String,
    tenant_id: String,
    name: String,
    description: String,
    category: String,
    price_cents: i64,
    stock: i32,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            category: row.category,
            price_cents: row.price_cents,
            stock: row.stock,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct CartItemRow {
    id: String,
    tenant_id: String,
    user_id: String,
    product_id: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            tenant_id: row.tenant_id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct AddressRow {
    id: String,
    tenant_id: String,
    user_id: String,
    name: String,
    phone: String,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    state: String,
    pincode: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            tenant_id: row.tenant_id,
            user_id: row.user_id,
            name: row.name,
            phone: row.phone,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow, Debug)]
struct OrderRow {
    id: String,
    tenant_id: String,
    user_id: String,
    address_id: String,
    order_number: String,
    status: String,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, CoreError> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| CoreError::Serialization(format!("Stored order has {}", e)))?;
        Ok(Order {
            id: self.id,
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            address_id: self.address_id,
            order_number: self.order_number,
            status,
            total_cents: self.total_cents,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow, Debug)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    quantity: i32,
    price_cents: i64,
}

/// Unique violations become `Conflict`; everything else is an infrastructure failure.
fn map_sqlx_error(e: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let message = match db.constraint() {
                Some("tenants_slug_key") => "Tenant slug is already taken",
                Some("tenants_domain_key") => "Tenant domain is already taken",
                Some("tenants_pkey") => "Tenant already exists",
                _ => "Record already exists",
            };
            return CoreError::Conflict(message.to_string());
        }
    }
    CoreError::Infrastructure(Box::new(e))
}

/// PostgreSQL implementation of the storage ports using sqlx.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> Result<(), CoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::Infrastructure(Box::new(e)))
    }
}

#[async_trait]
impl TenantStore for PostgresStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, CoreError> {
        let query = format!("SELECT {} FROM tenants WHERE id = $1", TENANT_COLUMNS);
        let row: Option<TenantRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Tenant::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError> {
        let query = format!("SELECT {} FROM tenants WHERE slug = $1", TENANT_COLUMNS);
        let row: Option<TenantRow> = sqlx::query_as(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Tenant::from))
    }

    async fn first_created(&self) -> Result<Option<Tenant>, CoreError> {
        let query = format!(
            "SELECT {} FROM tenants ORDER BY created_at ASC, id ASC LIMIT 1",
            TENANT_COLUMNS
        );
        let row: Option<TenantRow> = sqlx::query_as(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Tenant::from))
    }

    async fn list(&self) -> Result<Vec<Tenant>, CoreError> {
        let query = format!(
            "SELECT {} FROM tenants ORDER BY created_at ASC, id ASC",
            TENANT_COLUMNS
        );
        let rows: Vec<TenantRow> = sqlx::query_as(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn insert(&self, tenant: &Tenant) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO tenants ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            TENANT_COLUMNS
        );
        sqlx::query(&query)
            .bind(&tenant.id)
            .bind(&tenant.slug)
            .bind(&tenant.domain)
            .bind(&tenant.name)
            .bind(&tenant.description)
            .bind(&tenant.logo)
            .bind(&tenant.contact_email)
            .bind(&tenant.contact_phone)
            .bind(tenant.is_active)
            .bind(tenant.created_at)
            .bind(tenant.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE tenants SET slug = $2, domain = $3, name = $4, description = $5, logo = $6, \
             contact_email = $7, contact_phone = $8, is_active = $9, updated_at = $10 \
             WHERE id = $1",
        )
        .bind(&tenant.id)
        .bind(&tenant.slug)
        .bind(&tenant.domain)
        .bind(&tenant.name)
        .bind(&tenant.description)
        .bind(&tenant.logo)
        .bind(&tenant.contact_email)
        .bind(&tenant.contact_phone)
        .bind(tenant.is_active)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Tenant with ID {} not found",
                tenant.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PostgresStore {
    async fn upsert(&self, membership: &Membership) -> Result<bool, CoreError> {
        let result = sqlx::query(
            "INSERT INTO tenant_memberships (user_id, tenant_id, role, created_at) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (user_id, tenant_id) DO NOTHING",
        )
        .bind(&membership.user_id)
        .bind(&membership.tenant_id)
        .bind(membership.role.as_str())
        .bind(membership.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Membership>, CoreError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            "SELECT user_id, tenant_id, role, created_at FROM tenant_memberships \
             WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(Membership::try_from).collect()
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Membership>, CoreError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            "SELECT user_id, tenant_id, role, created_at FROM tenant_memberships \
             WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(Membership::try_from).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, CoreError> {
        let query = format!(
            "SELECT {} FROM products WHERE tenant_id = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> Result<Option<Product>, CoreError> {
        let query = format!(
            "SELECT {} FROM products WHERE tenant_id = $1 AND id = $2",
            PRODUCT_COLUMNS
        );
        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Product::from))
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO products ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            PRODUCT_COLUMNS
        );
        sqlx::query(&query)
            .bind(&product.id)
            .bind(&product.tenant_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.category)
            .bind(product.price_cents)
            .bind(product.stock)
            .bind(product.is_available)
            .bind(product.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_cart(&self, tenant_id: &str, user_id: &str) -> Result<Vec<CartItem>, CoreError> {
        let query = format!(
            "SELECT {} FROM cart_items WHERE tenant_id = $1 AND user_id = $2 \
             ORDER BY created_at ASC",
            CART_COLUMNS
        );
        let rows: Vec<CartItemRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn find_cart_item(
        &self,
        tenant_id: &str,
        user_id: &str,
        product_id: &str,
    ) -> Result<Option<CartItem>, CoreError> {
        let query = format!(
            "SELECT {} FROM cart_items WHERE tenant_id = $1 AND user_id = $2 AND product_id = $3",
            CART_COLUMNS
        );
        let row: Option<CartItemRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(CartItem::from))
    }

    async fn save_cart_item(&self, item: &CartItem) -> Result<(), CoreError> {
        let query = format!(
            "INSERT INTO cart_items ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, product_id, tenant_id) \
             DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = EXCLUDED.updated_at",
            CART_COLUMNS
        );
        sqlx::query(&query)
            .bind(&item.id)
            .bind(&item.tenant_id)
            .bind(&item.user_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    async fn list_addresses(
        &self,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Vec<Address>, CoreError> {
        let query = format!(
            "SELECT {} FROM addresses WHERE tenant_id = $1 AND user_id = $2 \
             ORDER BY is_default DESC, created_at DESC",
            ADDRESS_COLUMNS
        );
        let rows: Vec<AddressRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn find_address(
        &self,
        tenant_id: &str,
        user_id: &str,
        address_id: &str,
    ) -> Result<Option<Address>, CoreError> {
        let query = format!(
            "SELECT {} FROM addresses WHERE tenant_id = $1 AND user_id = $2 AND id = $3",
            ADDRESS_COLUMNS
        );
        let row: Option<AddressRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .bind(address_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Address::from))
    }

    async fn insert_address(&self, address: &Address) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        if address.is_default {
            sqlx::query(
                "UPDATE addresses SET is_default = FALSE \
                 WHERE tenant_id = $1 AND user_id = $2 AND is_default",
            )
            .bind(&address.tenant_id)
            .bind(&address.user_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }
        let query = format!(
            "INSERT INTO addresses ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            ADDRESS_COLUMNS
        );
        sqlx::query(&query)
            .bind(&address.id)
            .bind(&address.tenant_id)
            .bind(&address.user_id)
            .bind(&address.name)
            .bind(&address.phone)
            .bind(&address.address_line1)
            .bind(&address.address_line2)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.pincode)
            .bind(address.is_default)
            .bind(address.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(&self, order: &Order) -> Result<(), CoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let query = format!(
            "INSERT INTO orders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            ORDER_COLUMNS
        );
        sqlx::query(&query)
            .bind(&order.id)
            .bind(&order.tenant_id)
            .bind(&order.user_id)
            .bind(&order.address_id)
            .bind(&order.order_number)
            .bind(order.status.as_str())
            .bind(order.total_cents)
            .bind(order.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (order_id, position, product_id, quantity, price_cents) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&order.id)
            .bind(position as i32)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        let product_ids: Vec<String> = order.items.iter().map(|i| i.product_id.clone()).collect();
        sqlx::query(
            "DELETE FROM cart_items WHERE tenant_id = $1 AND user_id = $2 AND product_id = ANY($3)",
        )
        .bind(&order.tenant_id)
        .bind(&order.user_id)
        .bind(&product_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn list_orders(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, CoreError> {
        let query = format!(
            "SELECT {} FROM orders WHERE tenant_id = $1 \
             AND ($2::TEXT IS NULL OR user_id = $2) \
             AND ($3::TEXT IS NULL OR status = $3) \
             ORDER BY created_at DESC",
            ORDER_COLUMNS
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .bind(user_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, quantity, price_cents FROM order_items \
             WHERE order_id = ANY($1) ORDER BY order_id, position",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.order_id).or_default().push(OrderItem {
                product_id: row.product_id,
                quantity: row.quantity,
                price_cents: row.price_cents,
            });
        }
        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }
}
