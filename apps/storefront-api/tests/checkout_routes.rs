mod common;

use axum::http::StatusCode;
use common::{ROOT_TOKEN, bearer, harness, login, seed_product, seed_tenant};
use serde_json::{Value, json};
use storefront_core::domain::identity::Role;

fn address_body() -> Value {
    json!({
        "name": "Asha",
        "phone": "9876543210",
        "addressLine1": "12 Orchard Lane",
        "city": "Pune",
        "state": "MH",
        "pincode": "411001",
        "isDefault": true
    })
}

#[tokio::test]
async fn test_addresses_need_a_known_tenant() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t1").await;
    let (name, value) = bearer(&customer);

    let res = h
        .server
        .get("/api/addresses")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("Tenant slug is required"));

    let res = h
        .server
        .post("/api/addresses")
        .add_header(name.clone(), value.clone())
        .json(&address_body())
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = h
        .server
        .get("/api/addresses")
        .add_query_param("tenantSlug", "nowhere")
        .add_header(name, value)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_cannot_keep_addresses_at_a_foreign_storefront() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    let (name, value) = bearer(&admin);
    let res = h
        .server
        .post("/api/addresses")
        .add_query_param("tenantSlug", "berries")
        .add_header(name, value)
        .json(&address_body())
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert!(h.state.membership_store.list_for_tenant("t2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_address_validation() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t1").await;

    let (name, value) = bearer(&customer);
    let res = h
        .server
        .post("/api/addresses")
        .add_query_param("tenantSlug", "fruitland")
        .add_header(name, value)
        .json(&json!({ "name": "Asha" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("Missing required fields"));
}

#[tokio::test]
async fn test_checkout_at_another_storefront_keeps_one_membership() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    let berries = seed_product(&h.state, "t2", "Blueberries", 10).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t1").await;
    let (name, value) = bearer(&customer);

    let mut address_id = String::new();
    for _ in 0..2 {
        let res = h
            .server
            .post("/api/addresses")
            .add_query_param("tenantSlug", "berries")
            .add_header(name.clone(), value.clone())
            .json(&address_body())
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        let body: Value = res.json();
        assert_eq!(body["data"]["tenant_id"], "t2");
        address_id = body["data"]["id"].as_str().unwrap().to_string();
    }

    let body: Value = h
        .server
        .get("/api/addresses")
        .add_query_param("tenantSlug", "berries")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    let addresses = body["data"].as_array().unwrap();
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0]["id"], address_id.as_str());
    assert_eq!(addresses[0]["is_default"], true);
    assert_eq!(addresses[1]["is_default"], false);

    let res = h
        .server
        .post("/api/cart")
        .add_query_param("tenantSlug", "berries")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "productId": berries.id, "quantity": 3 }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let res = h
        .server
        .post("/api/orders")
        .add_query_param("tenantSlug", "berries")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "addressId": address_id }))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    let body: Value = res.json();
    assert_eq!(body["data"]["tenant_id"], "t2");
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["total_cents"], 597);

    let body: Value = h
        .server
        .get("/api/cart")
        .add_query_param("tenantSlug", "berries")
        .add_header(name, value)
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());

    let memberships = h.state.membership_store.list_for_tenant("t2").await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].user_id, "cust-1");
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_and_unknown_address() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    let customer = login(&h.state, "cust-1", Role::Customer, "t1").await;
    let (name, value) = bearer(&customer);

    let body: Value = h
        .server
        .post("/api/addresses")
        .add_query_param("tenantSlug", "fruitland")
        .add_header(name.clone(), value.clone())
        .json(&address_body())
        .await
        .json();
    let address_id = body["data"]["id"].as_str().unwrap().to_string();

    let res = h
        .server
        .post("/api/orders")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "addressId": address_id }))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("Cart is empty"));

    let res = h
        .server
        .post("/api/orders")
        .add_header(name, value)
        .json(&json!({ "addressId": "addr-missing" }))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_history_is_scoped_by_tenant_and_role() {
    let h = harness().await;
    seed_tenant(&h.state, "t1", "fruitland", 1).await;
    seed_tenant(&h.state, "t2", "berries", 2).await;
    let apples = seed_product(&h.state, "t1", "Apples", 10).await;
    let admin = login(&h.state, "admin-1", Role::Admin, "t1").await;

    for user in ["cust-1", "cust-2"] {
        let token = login(&h.state, user, Role::Customer, "t1").await;
        let (name, value) = bearer(&token);
        let body: Value = h
            .server
            .post("/api/addresses")
            .add_query_param("tenantSlug", "fruitland")
            .add_header(name.clone(), value.clone())
            .json(&address_body())
            .await
            .json();
        let address_id = body["data"]["id"].as_str().unwrap().to_string();
        h.server
            .post("/api/cart")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "productId": apples.id }))
            .await;
        let res = h
            .server
            .post("/api/orders")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "addressId": address_id }))
            .await;
        assert_eq!(res.status_code(), StatusCode::CREATED);

        let body: Value = h.server.get("/api/orders").add_header(name, value).await.json();
        let orders = body["data"].as_array().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["user_id"], user);
    }

    let (name, value) = bearer(&admin);
    let body: Value = h
        .server
        .get("/api/orders")
        .add_query_param("status", "pending")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(body["tenant_id"], "t1");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let body: Value = h
        .server
        .get("/api/orders")
        .add_query_param("status", "SHIPPED")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());

    let res = h
        .server
        .get("/api/orders")
        .add_query_param("status", "LOST")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = h
        .server
        .get("/api/orders")
        .add_query_param("tenantSlug", "berries")
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);

    let res = h
        .server
        .get("/api/orders")
        .add_query_param("tenantSlug", "nowhere")
        .add_header(name, value)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(ROOT_TOKEN);
    let body: Value = h
        .server
        .get("/api/orders")
        .add_query_param("tenantId", "t2")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["tenant_id"], "t2");
    assert!(body["data"].as_array().unwrap().is_empty());
}
