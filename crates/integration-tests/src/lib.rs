//! Integration tests for SupplyHub.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (no database needed)
//! cargo test -p supplyhub-integration-tests
//!
//! # Include the PostgreSQL store tests
//! DATABASE_URL=postgres://... cargo test -p supplyhub-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_orders` - Order lifecycle over HTTP
//! - `api_catalog` - Catalog, notification inbox and account approval
//! - `api_messages` - Direct messages and the account directory
//! - `postgres_store` - The `PostgreSQL` backend against a live database
//!
//! [`TestContext`] drives the full router in process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory store.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use supplyhub_core::{Actor, Email, Price, ProductId, Role};
use supplyhub_server::config::ApiSettings;
use supplyhub_server::db::{MemoryStore, ProductStore, UserStore};
use supplyhub_server::middleware::{USER_ID_HEADER, USER_ROLE_HEADER};
use supplyhub_server::models::{NewProduct, NewUser};
use supplyhub_server::state::AppState;

/// A decoded API response.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub body: Value,
}

impl ApiResponse {
    /// The `code` field of an error body.
    #[must_use]
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

/// The full application over a fresh in-memory store, with the three seeded
/// roles.
pub struct TestContext {
    pub store: MemoryStore,
    pub app: Router,
    pub super_admin: Actor,
    pub admin: Actor,
    pub customer: Actor,
}

impl TestContext {
    /// Build the app with a super admin, an admin and one customer.
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let app = supplyhub_server::app(AppState::new(store.clone(), ApiSettings::default()));

        let super_admin = add_user(&store, "superadmin@example.com", "Super Admin", Role::SuperAdmin).await;
        let admin = add_user(&store, "admin@example.com", "Admin User", Role::Admin).await;
        let customer = add_user(&store, "user@example.com", "Purchasing Organization", Role::User).await;

        Self {
            store,
            app,
            super_admin,
            admin,
            customer,
        }
    }

    /// Add another customer account.
    pub async fn add_customer(&self, email: &str, name: &str) -> Actor {
        add_user(&self.store, email, name, Role::User).await
    }

    /// Add a product directly to the store.
    pub async fn add_product(&self, name: &str, price_cents: i64, quantity: i32) -> ProductId {
        self.store
            .create_product(&NewProduct {
                name: name.to_string(),
                kind: None,
                location: None,
                description: None,
                price: Price::new(Decimal::new(price_cents, 2)).unwrap(),
                quantity,
            })
            .await
            .unwrap()
            .id
    }

    /// Send a request as `actor` (or anonymously).
    pub async fn send(
        &self,
        actor: Option<Actor>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder
                .header(USER_ID_HEADER, actor.id.to_string())
                .header(USER_ROLE_HEADER, actor.role.as_str());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        decode(self.app.clone().oneshot(request).await.unwrap()).await
    }

    /// GET as `actor`.
    pub async fn get(&self, actor: Actor, uri: &str) -> ApiResponse {
        self.send(Some(actor), Method::GET, uri, None).await
    }

    /// POST JSON as `actor`.
    pub async fn post(&self, actor: Actor, uri: &str, body: Value) -> ApiResponse {
        self.send(Some(actor), Method::POST, uri, Some(body)).await
    }

    /// PATCH JSON as `actor`.
    pub async fn patch(&self, actor: Actor, uri: &str, body: Value) -> ApiResponse {
        self.send(Some(actor), Method::PATCH, uri, Some(body)).await
    }
}

async fn add_user(store: &MemoryStore, email: &str, name: &str, role: Role) -> Actor {
    let user = store
        .create_user(&NewUser {
            email: Email::parse(email).unwrap(),
            name: name.to_string(),
            role,
            is_approved: true,
        })
        .await
        .unwrap();
    Actor::new(user.id, user.role)
}

async fn decode(response: Response) -> ApiResponse {
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    ApiResponse {
        status,
        request_id,
        body,
    }
}
