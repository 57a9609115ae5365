//! The `PostgreSQL` backend against a live database.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `DATABASE_URL` pointing at it (migrations are applied automatically)
//!
//! Run with: cargo test -p supplyhub-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use secrecy::SecretString;

use supplyhub_core::{Actor, Email, OrderAction, Price, Role};
use supplyhub_server::db::{
    self, CommitOutcome, MessageStore, NotificationStore, OrderStore, PgStore, ProductStore,
    StockDecrement, TransitionCommit, UserStore,
};
use supplyhub_server::models::{NewMessage, NewProduct, NewUser};
use supplyhub_server::services::{Decision, OrderLifecycle};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    PgStore::new(pool)
}

/// An email no other test run has used.
fn unique_email(prefix: &str) -> Email {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    Email::parse(&format!("{prefix}-{nanos}@example.com")).unwrap()
}

async fn actor(store: &PgStore, prefix: &str, role: Role) -> Actor {
    let user = store
        .create_user(&NewUser {
            email: unique_email(prefix),
            name: format!("{prefix} account"),
            role,
            is_approved: true,
        })
        .await
        .unwrap();
    Actor::new(user.id, user.role)
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_lifecycle_against_postgres() {
    let store = store().await;
    let lifecycle = OrderLifecycle::new(store.clone());
    let admin = actor(&store, "pg-admin", Role::Admin).await;
    let buyer = actor(&store, "pg-buyer", Role::User).await;

    let product = store
        .create_product(&NewProduct {
            name: "Cement Bags (50kg)".to_string(),
            kind: None,
            location: None,
            description: None,
            price: Price::new(Decimal::new(850, 2)).unwrap(),
            quantity: 100,
        })
        .await
        .unwrap();

    let order = lifecycle.create_order(buyer, product.id, 10).await.unwrap();
    assert_eq!(order.total_price.amount(), Decimal::new(8500, 2));

    lifecycle
        .decide(admin, order.id, Decision::Approve)
        .await
        .unwrap();
    lifecycle
        .upload_payment_proof(buyer, order.id, "receipts/pg.pdf")
        .await
        .unwrap();
    lifecycle
        .verify_payment(admin, order.id, Decision::Approve)
        .await
        .unwrap();
    let delivered = lifecycle.mark_delivered(admin, order.id).await.unwrap();
    assert_eq!(delivered.payment_proof.as_deref(), Some("receipts/pg.pdf"));

    let product = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(product.quantity, 90);

    let inbox = store.list_notifications(buyer.id, 10).await.unwrap();
    assert_eq!(inbox.len(), 3);
    assert_eq!(store.unread_count(buyer.id).await.unwrap(), 3);
    assert_eq!(store.mark_all_read(buyer.id).await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_stale_and_understocked_commits_write_nothing() {
    let store = store().await;
    let buyer = actor(&store, "pg-stale", Role::User).await;
    let lifecycle = OrderLifecycle::new(store.clone());

    let product = store
        .create_product(&NewProduct {
            name: "Plywood Sheets".to_string(),
            kind: None,
            location: None,
            description: None,
            price: Price::new(Decimal::new(2_500, 2)).unwrap(),
            quantity: 5,
        })
        .await
        .unwrap();
    let order = lifecycle.create_order(buyer, product.id, 5).await.unwrap();
    let created = order.state();
    let approved = created.apply(OrderAction::Approve).unwrap().to;

    let commit = TransitionCommit {
        order_id: order.id,
        expected: created,
        expected_proof: None,
        next: approved,
        payment_proof: None,
        stock_decrement: Some(StockDecrement {
            product_id: product.id,
            quantity: 6,
        }),
    };
    assert_eq!(
        store.commit_transition(&commit).await.unwrap(),
        CommitOutcome::InsufficientStock { available: 5 }
    );
    assert_eq!(store.get_order(order.id).await.unwrap().unwrap().state(), created);

    let commit = TransitionCommit {
        stock_decrement: None,
        ..commit
    };
    assert!(matches!(
        store.commit_transition(&commit).await.unwrap(),
        CommitOutcome::Applied(_)
    ));
    // Same expectation again is now stale
    assert_eq!(
        store.commit_transition(&commit).await.unwrap(),
        CommitOutcome::Conflict
    );
    assert_eq!(
        store.get_product(product.id).await.unwrap().unwrap().quantity,
        5
    );
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database"]
async fn test_messages_against_postgres() {
    let store = store().await;
    let admin = actor(&store, "pg-msg-admin", Role::Admin).await;
    let buyer = actor(&store, "pg-msg-buyer", Role::User).await;

    let send = |from: Actor, to: Actor, text: &str| NewMessage {
        sender_id: from.id,
        receiver_id: to.id,
        message: text.to_string(),
    };
    let first = store
        .insert_message(&send(buyer, admin, "Is rebar back in stock?"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.sender.name, "pg-msg-buyer account");
    assert_eq!(first.receiver.role, Role::Admin);
    store
        .insert_message(&send(admin, buyer, "Next week."))
        .await
        .unwrap()
        .unwrap();

    let thread = store.list_messages(buyer.id, Some(admin.id)).await.unwrap();
    let texts: Vec<_> = thread.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, ["Is rebar back in stock?", "Next week."]);

    let all = store.list_messages(admin.id, None).await.unwrap();
    assert_eq!(all.first().unwrap().message, "Next week.");

    assert!(!store.mark_message_read(first.id, buyer.id).await.unwrap());
    assert!(store.mark_message_read(first.id, admin.id).await.unwrap());

    let ghost = NewMessage {
        sender_id: buyer.id,
        receiver_id: supplyhub_core::UserId::new(i32::MAX),
        message: "hello?".to_string(),
    };
    assert!(store.insert_message(&ghost).await.unwrap().is_none());

    let staff = store.list_users(Some(&[Role::Admin])).await.unwrap();
    assert!(staff.iter().all(|u| u.role == Role::Admin));
    assert!(staff.iter().any(|u| u.id == admin.id));
}
