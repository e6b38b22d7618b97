mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use common::{ROOT_TOKEN, bearer, harness, login, seed_product, seed_tenant};
use serde_json::{Value, json};
use storefront_core::domain::identity::Role;

fn product_names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_admin_only_sees_own_tenant_whatever_the_hint() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    seed_product(&h.state, "t1", "Apples", 10).await;
    seed_product(&h.state, "t2", "Blueberries", 10).await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    let (name, value) = bearer(&admin);
    let res = h
        .server
        .get("/api/admin/products")
        .add_query_param("tenantId", "t2")
        .add_header(name.clone(), value.clone())
        .add_header(
            HeaderName::from_static("x-tenant-slug"),
            HeaderValue::from_static("berries"),
        )
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    let body: Value = res.json();
    assert_eq!(body["tenant_id"], "t1");
    assert_eq!(product_names(&body), vec!["Apples"]);
}

#[tokio::test]
async fn test_admin_creates_products_in_own_tenant() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    let (name, value) = bearer(&admin);
    let res = h
        .server
        .post("/api/admin/products")
        .add_query_param("tenantId", "t2")
        .add_header(name, value)
        .json(&json!({
            "name": "Mangoes",
            "category": "tropical",
            "price_cents": 350,
            "stock": 12
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["data"]["tenant_id"], "t1");

    assert!(h.state.catalog.list_products("t2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_product_validates_payload() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    let (name, value) = bearer(&admin);
    let res = h
        .server
        .post("/api/admin/products")
        .add_header(name, value)
        .json(&json!({ "category": "tropical", "price_cents": 350, "stock": 12 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_superadmin_targets_tenant_by_hint() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;

    let (name, value) = bearer(ROOT_TOKEN);
    let res = h
        .server
        .post("/api/admin/products")
        .add_query_param("tenantSlug", "berries")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "name": "Raspberries",
            "category": "berries",
            "price_cents": 420,
            "stock": 5
        }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["data"]["tenant_id"], "t2");

    // Without a hint the earliest tenant is used.
    let body: Value = h
        .server
        .get("/api/admin/products")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(body["tenant_id"], "t1");
    assert!(product_names(&body).is_empty());

    let res = h
        .server
        .get("/api/admin/products")
        .add_query_param("tenantId", "ghost")
        .add_header(name, value)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customers_are_kept_out_of_the_back_office() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t1").await;
    let courier = login(&h.state, "courier-1", Role::DeliveryPartner, "t1").await;

    for token in [&customer, &courier] {
        let (name, value) = bearer(token);
        let res = h
            .server
            .get("/api/admin/products")
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

        let res = h
            .server
            .get("/api/admin/memberships")
            .add_header(name, value)
            .await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_lists_shoppers_of_own_tenant() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t2").await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    // A visit to the storefront's cart records the membership.
    let (name, value) = bearer(&customer);
    let res = h
        .server
        .get("/api/cart")
        .add_query_param("tenantSlug", "fruitland")
        .add_header(name, value)
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let (name, value) = bearer(&admin);
    let body: Value = h
        .server
        .get("/api/admin/memberships")
        .add_header(name, value)
        .await
        .json();
    let members = body["data"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], "cust-1");
    assert_eq!(members[0]["role"], "CUSTOMER");
    assert_eq!(body["tenant_id"], "t1");
}
