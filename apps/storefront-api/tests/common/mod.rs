#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use storefront_api::{AppState, create_app};
use storefront_core::domain::{
    catalog::{NewProduct, Product},
    identity::{Identity, Role},
    tenant::{NewTenant, Tenant},
};

pub const ROOT_TOKEN: &str = "root-token";

pub struct Harness {
    pub server: TestServer,
    pub state: AppState,
}

/// In-memory server with a SUPERADMIN session under [`ROOT_TOKEN`].
pub async fn harness() -> Harness {
    let state = AppState::in_memory();
    state
        .sessions
        .insert(ROOT_TOKEN, &Identity::super_admin("root").unwrap())
        .await
        .unwrap();
    let server = TestServer::new(create_app(state.clone())).expect("start test server");
    Harness { server, state }
}

/// Inserts a tenant created `minute` minutes into 2024.
pub async fn seed_tenant(state: &AppState, id: &str, slug: &str, minute: u32) -> Tenant {
    let tenant = NewTenant {
        name: format!("{} store", slug),
        slug: Some(slug.to_string()),
        ..Default::default()
    }
    .into_tenant(
        id.to_string(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
    )
    .unwrap();
    state.tenant_store.insert(&tenant).await.unwrap();
    tenant
}

pub async fn seed_product(state: &AppState, tenant_id: &str, name: &str, stock: i32) -> Product {
    let product = NewProduct {
        name: name.to_string(),
        description: None,
        category: "fresh".into(),
        price_cents: 199,
        stock,
        is_available: None,
    }
    .into_product(tenant_id, Utc::now())
    .unwrap();
    state.catalog.insert_product(&product).await.unwrap();
    product
}

/// Registers a session for a tenant-bound user and returns its token.
pub async fn login(state: &AppState, user_id: &str, role: Role, tenant_id: &str) -> String {
    let identity = Identity::member(user_id, role, tenant_id).unwrap();
    state.sessions.issue(&identity).await.unwrap()
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

pub fn tenant_slug_header(slug: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-tenant-slug"),
        HeaderValue::from_str(slug).unwrap(),
    )
}
