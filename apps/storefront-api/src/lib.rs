use axum::{
    Json, Router,
    middleware::{self},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use http::StatusCode;
use std::{sync::Arc, time::Duration};
use storefront_core::{
    AddressStore, Cache, CatalogStore, CoreError, MembershipStore, OrderStore, TenantStore,
    adapters::{InMemoryCache, InMemoryStore},
    tenancy::{MembershipEnsurer, TenantDirectory, TenantResolver},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

pub mod application;
pub mod config;

use application::{
    commands::{
        add_to_cart::handle_add_to_cart,
        create_address::handle_create_address,
        create_product::handle_create_product,
        create_tenant::handle_create_tenant,
        issue_session::{handle_issue_session, handle_revoke_session},
        place_order::handle_place_order,
        set_active_tenant::handle_set_active_tenant,
        update_tenant::handle_update_tenant,
    },
    middleware::session_auth,
    query::{
        handle_current_tenant, handle_get_cart, handle_get_storefront_tenant,
        handle_list_active_tenants, handle_list_addresses, handle_list_admin_products,
        handle_list_all_tenants, handle_list_memberships, handle_list_orders,
        handle_list_storefront_products,
    },
    session::SessionStore,
};

/// The persistence ports, usually all backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub tenants: Arc<dyn TenantStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orders: Arc<dyn OrderStore>,
}

impl Stores {
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: TenantStore + MembershipStore + CatalogStore + AddressStore + OrderStore + 'static,
    {
        Self {
            tenants: store.clone(),
            memberships: store.clone(),
            catalog: store.clone(),
            addresses: store.clone(),
            orders: store,
        }
    }
}

// Holds shared dependencies
#[derive(Clone)]
pub struct AppState {
    pub directory: TenantDirectory,
    pub resolver: TenantResolver,
    pub memberships: MembershipEnsurer,
    pub tenant_store: Arc<dyn TenantStore>,
    pub membership_store: Arc<dyn MembershipStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orders: Arc<dyn OrderStore>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Tenant lookups and sessions get separate caches so one cannot evict the other.
    pub fn new(stores: Stores, tenant_cache: Arc<dyn Cache>, session_cache: Arc<dyn Cache>) -> Self {
        let directory = TenantDirectory::new(stores.tenants.clone(), tenant_cache);
        Self {
            resolver: TenantResolver::new(directory.clone()),
            directory,
            memberships: MembershipEnsurer::new(stores.memberships.clone()),
            tenant_store: stores.tenants,
            membership_store: stores.memberships,
            catalog: stores.catalog,
            addresses: stores.addresses,
            orders: stores.orders,
            sessions: SessionStore::new(session_cache),
        }
    }

    /// Everything in process memory. Used by tests and when no database is configured.
    pub fn in_memory() -> Self {
        Self::new(
            Stores::shared(Arc::new(InMemoryStore::default())),
            Arc::new(InMemoryCache::default()),
            Arc::new(InMemoryCache::default()),
        )
    }

    pub fn with_tenant_cache_ttl(mut self, ttl: Duration) -> Self {
        self.directory = self.directory.with_ttl(ttl);
        self.resolver = TenantResolver::new(self.directory.clone());
        self
    }

    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.directory = self.directory.with_store_timeout(timeout);
        self.resolver = TenantResolver::new(self.directory.clone());
        self.sessions = self.sessions.with_timeout(timeout);
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = self.sessions.with_ttl(ttl);
        self
    }
}

// Function to create the main Axum router with state
pub fn create_app(app_state: AppState) -> Router {
    // Storefront reads need no session, only a tenant hint.
    let public_routes = Router::new()
        .route("/tenants/{slug}", get(handle_get_storefront_tenant))
        .route("/products", get(handle_list_storefront_products));

    let session_routes = Router::new()
        .route("/tenants", get(handle_list_active_tenants))
        .route(
            "/superadmin/tenants",
            get(handle_list_all_tenants).post(handle_create_tenant),
        )
        .route("/superadmin/tenants/{id}", patch(handle_update_tenant))
        .route("/superadmin/sessions", post(handle_issue_session))
        .route("/session", delete(handle_revoke_session))
        .route("/tenant/set-active", post(handle_set_active_tenant))
        .route("/tenant/current", get(handle_current_tenant))
        .route(
            "/admin/products",
            get(handle_list_admin_products).post(handle_create_product),
        )
        .route("/admin/memberships", get(handle_list_memberships))
        .route("/cart", get(handle_get_cart).post(handle_add_to_cart))
        .route(
            "/addresses",
            get(handle_list_addresses).post(handle_create_address),
        )
        .route("/orders", get(handle_list_orders).post(handle_place_order))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            session_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", public_routes.merge(session_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

// --- Error mapping ---

/// Route-boundary wrapper that turns a [`CoreError`] into a status code and JSON body.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl<E> From<E> for ApiError
where
    E: Into<CoreError>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = map_core_error(&self.0);
        let message = if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
            self.0.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub fn map_core_error(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Inactive(_) | CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
        CoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        CoreError::TenantRequired(_) | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Infrastructure(_) | CoreError::Unavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CoreError::Serialization(_) | CoreError::Configuration(_) | CoreError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_core_error() {
        let cases = [
            (CoreError::NotFound("t".into()), StatusCode::NOT_FOUND),
            (CoreError::Inactive("t".into()), StatusCode::FORBIDDEN),
            (CoreError::Forbidden("t".into()), StatusCode::FORBIDDEN),
            (CoreError::Unauthenticated("t".into()), StatusCode::UNAUTHORIZED),
            (CoreError::TenantRequired("t".into()), StatusCode::BAD_REQUEST),
            (CoreError::Validation("t".into()), StatusCode::BAD_REQUEST),
            (CoreError::Conflict("t".into()), StatusCode::CONFLICT),
            (
                CoreError::Infrastructure("db down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CoreError::Unavailable("t".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CoreError::Internal("t".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(map_core_error(&err), expected, "{:?}", err);
        }
    }

    #[test]
    fn test_domain_errors_convert_through_core_error() {
        let err: ApiError = storefront_core::domain::tenant::TenantError::InvalidInput(
            "Tenant name cannot be empty".into(),
        )
        .into();
        assert_eq!(map_core_error(&err.0), StatusCode::BAD_REQUEST);

        let err: ApiError = storefront_core::domain::checkout::CheckoutError::EmptyCart.into();
        assert_eq!(map_core_error(&err.0), StatusCode::BAD_REQUEST);
        let err: ApiError =
            storefront_core::domain::checkout::CheckoutError::ProductUnavailable("p1".into())
                .into();
        assert_eq!(map_core_error(&err.0), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_the_tenant_cache() {
        let tenant_cache: Arc<dyn Cache> = Arc::new(InMemoryCache::default());
        let session_cache: Arc<dyn Cache> = Arc::new(InMemoryCache::default());
        let state = AppState::new(
            Stores::shared(Arc::new(InMemoryStore::default())),
            tenant_cache.clone(),
            session_cache.clone(),
        );
        let identity = storefront_core::domain::identity::Identity::super_admin("root").unwrap();

        state.sessions.insert("tok", &identity).await.unwrap();

        assert!(session_cache.get("session:tok").await.unwrap().is_some());
        assert!(tenant_cache.get("session:tok").await.unwrap().is_none());
    }
}
