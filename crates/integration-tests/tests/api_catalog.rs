//! Catalog, notification inbox and account approval over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use supplyhub_core::{Email, Role};
use supplyhub_integration_tests::TestContext;
use supplyhub_server::db::UserStore;
use supplyhub_server::models::NewUser;

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_staff_manage_the_catalog() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({
                "name": "  Rebar 12mm  ",
                "type": "Construction Materials",
                "location": "Warehouse A - City Center",
                "price": "12.40",
                "quantity": 300
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    assert_eq!(resp.body["product"]["name"], "Rebar 12mm");
    let id = resp.body["product"]["id"].as_i64().unwrap();

    let resp = ctx
        .patch(
            ctx.super_admin,
            &format!("/api/products/{id}"),
            json!({ "price": "13.00", "quantity": 250 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["product"]["price"], "13.00");
    assert_eq!(resp.body["product"]["quantity"], 250);
}

#[tokio::test]
async fn test_customers_cannot_manage_the_catalog() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Plywood Sheets", 2_500, 800).await;

    let resp = ctx
        .post(
            ctx.customer,
            "/api/products",
            json!({ "name": "Free stuff", "price": "0", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx
        .patch(
            ctx.customer,
            &format!("/api/products/{product}"),
            json!({ "quantity": 99_999 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_catalog_validation() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "   ", "price": "1.00", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "Sand", "price": "1.00", "quantity": -1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "Sand", "price": "-1.00", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "Sand", "price": "10.005", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "BAD_REQUEST");

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "Sand", "price": "1000000000000", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = ctx
        .post(
            ctx.admin,
            "/api/products",
            json!({ "name": "Sand", "price": "7.5", "quantity": 1 }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["product"]["price"], "7.50");

    let resp = ctx
        .patch(ctx.admin, "/api/products/4242", json!({ "quantity": 1 }))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_search_and_pagination() {
    let ctx = TestContext::new().await;
    ctx.add_product("Cement Bags (50kg)", 850, 10_000).await;
    ctx.add_product("Electrical Cables", 4_500, 2_000).await;
    ctx.add_product("White Cement", 1_200, 40).await;

    let resp = ctx.get(ctx.customer, "/api/products?search=cement").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["pagination"]["total"], 2);
    assert_eq!(resp.body["products"][0]["name"], "White Cement");

    let resp = ctx.get(ctx.customer, "/api/products?page=2&limit=2").await;
    assert_eq!(resp.body["products"].as_array().unwrap().len(), 1);
    assert_eq!(resp.body["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn test_order_total_survives_price_change() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Cement Bags (50kg)", 850, 100).await;

    let resp = ctx
        .post(
            ctx.customer,
            "/api/orders",
            json!({ "productId": product, "quantity": 2 }),
        )
        .await;
    let id = resp.body["order"]["id"].as_i64().unwrap();

    ctx.patch(
        ctx.admin,
        &format!("/api/products/{product}"),
        json!({ "price": "99.99" }),
    )
    .await;

    let resp = ctx.get(ctx.customer, &format!("/api/orders/{id}")).await;
    assert_eq!(resp.body["order"]["totalPrice"], "17.00");
}

// ============================================================================
// Notification Inbox
// ============================================================================

#[tokio::test]
async fn test_inbox_read_tracking() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Cement Bags (50kg)", 850, 100).await;

    for _ in 0..2 {
        let resp = ctx
            .post(
                ctx.customer,
                "/api/orders",
                json!({ "productId": product, "quantity": 1 }),
            )
            .await;
        let id = resp.body["order"]["id"].as_i64().unwrap();
        ctx.patch(ctx.admin, &format!("/api/orders/{id}"), json!({ "status": "APPROVED" }))
            .await;
    }

    let inbox = ctx.get(ctx.customer, "/api/notifications").await;
    assert_eq!(inbox.body["unreadCount"], 2);
    let first = inbox.body["notifications"][0]["id"].as_i64().unwrap();

    // Someone else's notification looks missing
    let resp = ctx
        .send(
            Some(ctx.admin),
            Method::POST,
            &format!("/api/notifications/{first}/read"),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx
        .send(
            Some(ctx.customer),
            Method::POST,
            &format!("/api/notifications/{first}/read"),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);

    let inbox = ctx.get(ctx.customer, "/api/notifications").await;
    assert_eq!(inbox.body["unreadCount"], 1);
    assert_eq!(inbox.body["notifications"][0]["isRead"], true);

    let resp = ctx
        .send(
            Some(ctx.customer),
            Method::POST,
            "/api/notifications/mark-all-read",
            None,
        )
        .await;
    assert_eq!(resp.body["updated"], 1);

    let inbox = ctx.get(ctx.customer, "/api/notifications").await;
    assert_eq!(inbox.body["unreadCount"], 0);
}

// ============================================================================
// Account Approval
// ============================================================================

#[tokio::test]
async fn test_super_admin_approves_accounts() {
    let ctx = TestContext::new().await;
    let pending = ctx
        .store
        .create_user(&NewUser {
            email: Email::parse("new-buyer@example.com").unwrap(),
            name: "New Buyer".to_string(),
            role: Role::User,
            is_approved: false,
        })
        .await
        .unwrap();
    let uri = format!("/api/users/{}/approve", pending.id);

    let resp = ctx.send(Some(ctx.admin), Method::POST, &uri, None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.send(Some(ctx.super_admin), Method::POST, &uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["isApproved"], true);

    // Approving twice does not notify twice
    ctx.send(Some(ctx.super_admin), Method::POST, &uri, None)
        .await;

    let owner = supplyhub_core::Actor::new(pending.id, Role::User);
    let inbox = ctx.get(owner, "/api/notifications").await;
    let notifications = inbox.body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "ACCOUNT_APPROVED");

    let resp = ctx
        .send(Some(ctx.super_admin), Method::POST, "/api/users/9999/approve", None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
