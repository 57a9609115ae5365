//! Direct messages and the account directory over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use supplyhub_integration_tests::TestContext;

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn test_customers_look_up_staff_by_role() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .get(ctx.customer, "/api/users?role=ADMIN,SUPER_ADMIN")
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
    let users = resp.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    // Newest first
    assert_eq!(users[0]["id"], ctx.admin.id.as_i32());
    assert_eq!(users[1]["id"], ctx.super_admin.id.as_i32());
    assert_eq!(users[0]["role"], "ADMIN");
}

#[tokio::test]
async fn test_full_directory_is_super_admin_only() {
    let ctx = TestContext::new().await;

    let resp = ctx.get(ctx.admin, "/api/users").await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = ctx.get(ctx.super_admin, "/api/users").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["users"].as_array().unwrap().len(), 3);

    let resp = ctx.get(ctx.customer, "/api/users?role=OWNER").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_conversation_between_customer_and_admin() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            ctx.customer,
            "/api/messages",
            json!({ "receiverId": ctx.admin.id, "message": "Can you deliver on Sunday?" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    assert_eq!(resp.body["message"]["sender"]["name"], "Purchasing Organization");
    assert_eq!(resp.body["message"]["receiver"]["role"], "ADMIN");
    assert_eq!(resp.body["message"]["isRead"], false);
    let first = resp.body["message"]["id"].as_i64().unwrap();

    let resp = ctx
        .post(
            ctx.admin,
            "/api/messages",
            json!({ "receiverId": ctx.customer.id, "message": "Yes, before noon." }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);

    // A conversation reads oldest first
    let uri = format!("/api/messages?userId={}", ctx.admin.id);
    let resp = ctx.get(ctx.customer, &uri).await;
    let thread = resp.body["messages"].as_array().unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0]["message"], "Can you deliver on Sunday?");
    assert_eq!(thread[1]["message"], "Yes, before noon.");

    // Everything reads newest first
    let resp = ctx.get(ctx.admin, "/api/messages").await;
    let all = resp.body["messages"].as_array().unwrap();
    assert_eq!(all[0]["message"], "Yes, before noon.");

    // Only the receiver can mark a message read
    let uri = format!("/api/messages/{first}/read");
    let resp = ctx.send(Some(ctx.customer), Method::PATCH, &uri, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = ctx.send(Some(ctx.admin), Method::PATCH, &uri, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);

    let resp = ctx
        .get(ctx.admin, &format!("/api/messages?userId={}", ctx.customer.id))
        .await;
    assert_eq!(resp.body["messages"][0]["isRead"], true);
    assert_eq!(resp.body["messages"][1]["isRead"], false);
}

#[tokio::test]
async fn test_conversations_are_private() {
    let ctx = TestContext::new().await;
    let other = ctx.add_customer("other@example.com", "Other Org").await;

    ctx.post(
        ctx.customer,
        "/api/messages",
        json!({ "receiverId": ctx.admin.id, "message": "Our invoice is wrong" }),
    )
    .await;

    let resp = ctx.get(other, "/api/messages").await;
    assert!(resp.body["messages"].as_array().unwrap().is_empty());

    let uri = format!("/api/messages?userId={}", ctx.admin.id);
    let resp = ctx.get(other, &uri).await;
    assert!(resp.body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_validation() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            ctx.customer,
            "/api/messages",
            json!({ "receiverId": ctx.admin.id, "message": "   " }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.code(), "BAD_REQUEST");

    let resp = ctx
        .post(
            ctx.customer,
            "/api/messages",
            json!({ "receiverId": 9999, "message": "hello?" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = ctx
        .send(None, Method::GET, "/api/messages", None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}
