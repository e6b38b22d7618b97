use crate::{
    AddressStore, CatalogStore, CoreError, MembershipStore, OrderStore, TenantStore,
    domain::{
        catalog::{CartItem, Product},
        checkout::{Address, Order, OrderStatus},
        membership::Membership,
        tenant::Tenant,
    },
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory implementation of the storage ports for tests and single-process mode.
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tenants: Arc<DashMap<String, Tenant>>,
    // Serializes tenant writes so slug/domain uniqueness checks cannot interleave.
    tenant_writes: Arc<Mutex<()>>,
    // (user_id, tenant_id) -> Membership
    memberships: Arc<DashMap<(String, String), Membership>>,
    products: Arc<DashMap<String, Product>>,
    // (user_id, product_id, tenant_id) -> CartItem
    cart_items: Arc<DashMap<(String, String, String), CartItem>>,
    addresses: Arc<DashMap<String, Address>>,
    // Keeps the single-default flip and the insert together.
    address_writes: Arc<Mutex<()>>,
    orders: Arc<DashMap<String, Order>>,
}

impl InMemoryStore {
    fn unique_violation(&self, candidate: &Tenant) -> Option<CoreError> {
        self.tenants
            .iter()
            .filter(|entry| entry.key() != &candidate.id)
            .find_map(|entry| {
                let other = entry.value();
                if candidate.slug.is_some() && other.slug == candidate.slug {
                    Some(CoreError::Conflict(format!(
                        "Tenant slug '{}' is already taken",
                        candidate.label()
                    )))
                } else if candidate.domain.is_some() && other.domain == candidate.domain {
                    Some(CoreError::Conflict(format!(
                        "Tenant domain '{}' is already taken",
                        candidate.domain.as_deref().unwrap_or_default()
                    )))
                } else {
                    None
                }
            })
    }
}

#[async_trait]
impl TenantStore for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, CoreError> {
        Ok(self.tenants.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, CoreError> {
        Ok(self
            .tenants
            .iter()
            .find(|entry| entry.value().slug.as_deref() == Some(slug))
            .map(|entry| entry.value().clone()))
    }

    async fn first_created(&self) -> Result<Option<Tenant>, CoreError> {
        Ok(self
            .tenants
            .iter()
            .map(|entry| entry.value().clone())
            .min_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id))))
    }

    async fn list(&self) -> Result<Vec<Tenant>, CoreError> {
        let mut tenants: Vec<Tenant> = self
            .tenants
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tenants.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(tenants)
    }

    async fn insert(&self, tenant: &Tenant) -> Result<(), CoreError> {
        let _guard = self.tenant_writes.lock().await;
        if self.tenants.contains_key(&tenant.id) {
            return Err(CoreError::Conflict(format!(
                "Tenant with ID {} already exists",
                tenant.id
            )));
        }
        if let Some(err) = self.unique_violation(tenant) {
            return Err(err);
        }
        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), CoreError> {
        let _guard = self.tenant_writes.lock().await;
        if !self.tenants.contains_key(&tenant.id) {
            return Err(CoreError::NotFound(format!(
                "Tenant with ID {} not found",
                tenant.id
            )));
        }
        if let Some(err) = self.unique_violation(tenant) {
            return Err(err);
        }
        self.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn upsert(&self, membership: &Membership) -> Result<bool, CoreError> {
        let key = (membership.user_id.clone(), membership.tenant_id.clone());
        let mut created = false;
        self.memberships.entry(key).or_insert_with(|| {
            created = true;
            membership.clone()
        });
        Ok(created)
    }

    async fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<Membership>, CoreError> {
        let mut memberships: Vec<Membership> = self
            .memberships
            .iter()
            .filter(|entry| entry.value().tenant_id == tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        memberships.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(memberships)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Membership>, CoreError> {
        let mut memberships: Vec<Membership> = self
            .memberships
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        memberships.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(memberships)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_products(&self, tenant_id: &str) -> Result<Vec<Product>, CoreError> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|entry| entry.value().tenant_id == tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> Result<Option<Product>, CoreError> {
        Ok(self
            .products
            .get(product_id)
            .filter(|entry| entry.value().tenant_id == tenant_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CoreError> {
        if self.products.contains_key(&product.id) {
            return Err(CoreError::Conflict(format!(
                "Product with ID {} already exists",
                product.id
            )));
        }
        self.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn list_cart(&self, tenant_id: &str, user_id: &str) -> Result<Vec<CartItem>, CoreError> {
        let mut items: Vec<CartItem> = self
            .cart_items
            .iter()
            .filter(|entry| {
                let item = entry.value();
                item.tenant_id == tenant_id && item.user_id == user_id
            })
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(items)
    }

    async fn find_cart_item(
        &self,
        tenant_id: &str,
        user_id: &str,
        product_id: &str,
    ) -> Result<Option<CartItem>, CoreError> {
        let key = (
            user_id.to_string(),
            product_id.to_string(),
            tenant_id.to_string(),
        );
        Ok(self.cart_items.get(&key).map(|entry| entry.value().clone()))
    }

    async fn save_cart_item(&self, item: &CartItem) -> Result<(), CoreError> {
        let key = (
            item.user_id.clone(),
            item.product_id.clone(),
            item.tenant_id.clone(),
        );
        self.cart_items.insert(key, item.clone());
        Ok(())
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn list_addresses(
        &self,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Vec<Address>, CoreError> {
        let mut addresses: Vec<Address> = self
            .addresses
            .iter()
            .filter(|entry| {
                let address = entry.value();
                address.tenant_id == tenant_id && address.user_id == user_id
            })
            .map(|entry| entry.value().clone())
            .collect();
        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(addresses)
    }

    async fn find_address(
        &self,
        tenant_id: &str,
        user_id: &str,
        address_id: &str,
    ) -> Result<Option<Address>, CoreError> {
        Ok(self
            .addresses
            .get(address_id)
            .filter(|entry| entry.value().tenant_id == tenant_id && entry.value().user_id == user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn insert_address(&self, address: &Address) -> Result<(), CoreError> {
        let _guard = self.address_writes.lock().await;
        if self.addresses.contains_key(&address.id) {
            return Err(CoreError::Conflict(format!(
                "Address with ID {} already exists",
                address.id
            )));
        }
        if address.is_default {
            for mut entry in self.addresses.iter_mut() {
                let other = entry.value_mut();
                if other.tenant_id == address.tenant_id && other.user_id == address.user_id {
                    other.is_default = false;
                }
            }
        }
        self.addresses.insert(address.id.clone(), address.clone());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn place_order(&self, order: &Order) -> Result<(), CoreError> {
        if self.orders.contains_key(&order.id) {
            return Err(CoreError::Conflict(format!(
                "Order with ID {} already exists",
                order.id
            )));
        }
        self.orders.insert(order.id.clone(), order.clone());
        for item in &order.items {
            self.cart_items.remove(&(
                order.user_id.clone(),
                item.product_id.clone(),
                order.tenant_id.clone(),
            ));
        }
        Ok(())
    }

    async fn list_orders(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, CoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| {
                let order = entry.value();
                order.tenant_id == tenant_id
                    && user_id.is_none_or(|user| order.user_id == user)
                    && status.is_none_or(|status| order.status == status)
            })
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
