//! Walk one order through its full lifecycle against the in-memory store.
//!
//! No database is needed. Every step and the resulting notifications are
//! logged, which makes this a quick way to see the state machine at work.

use rust_decimal::Decimal;
use tracing::info;

use supplyhub_core::{Actor, Email, Price, Role};
use supplyhub_server::db::{MemoryStore, NotificationStore, ProductStore, UserStore};
use supplyhub_server::models::{NewProduct, NewUser, Order, User};
use supplyhub_server::services::{Decision, LifecycleError, OrderLifecycle};

use super::CommandError;

/// Run the demo.
///
/// # Errors
///
/// Returns an error if any lifecycle step is refused.
pub async fn run() -> Result<(), CommandError> {
    let store = MemoryStore::new();
    let lifecycle = OrderLifecycle::new(store.clone());

    let admin = add_user(&store, "admin@example.com", "Admin User", Role::Admin).await?;
    let buyer = add_user(
        &store,
        "user@example.com",
        "Purchasing Organization",
        Role::User,
    )
    .await?;
    let admin_actor = Actor::new(admin.id, admin.role);
    let buyer_actor = Actor::new(buyer.id, buyer.role);

    let price = Price::new(Decimal::new(850, 2))
        .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let product = store
        .create_product(&NewProduct {
            name: "Cement Bags (50kg)".to_string(),
            kind: Some("Construction Materials".to_string()),
            location: Some("Warehouse B - North District".to_string()),
            description: Some("Premium Portland cement".to_string()),
            price,
            quantity: 100,
        })
        .await?;
    info!(product_id = %product.id, stock = product.quantity, "Catalog ready");

    let order = step(
        "placed",
        lifecycle.create_order(buyer_actor, product.id, 10).await,
    )?;
    step(
        "approved",
        lifecycle
            .decide(admin_actor, order.id, Decision::Approve)
            .await,
    )?;
    step(
        "payment proof uploaded",
        lifecycle
            .upload_payment_proof(buyer_actor, order.id, "receipts/cement-10.pdf")
            .await,
    )?;
    step(
        "payment verified",
        lifecycle
            .verify_payment(admin_actor, order.id, Decision::Approve)
            .await,
    )?;
    step(
        "delivered",
        lifecycle.mark_delivered(admin_actor, order.id).await,
    )?;

    if let Some(product) = store.get_product(product.id).await? {
        info!(product_id = %product.id, stock = product.quantity, "Stock after delivery");
    }

    for user in [&buyer, &admin] {
        for n in store.list_notifications(user.id, 50).await?.iter().rev() {
            info!(recipient = %user.name, kind = %n.kind, title = %n.title, "{}", n.message);
        }
    }

    Ok(())
}

async fn add_user(
    store: &MemoryStore,
    email: &str,
    name: &str,
    role: Role,
) -> Result<User, CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    Ok(store
        .create_user(&NewUser {
            email,
            name: name.to_string(),
            role,
            is_approved: true,
        })
        .await?)
}

fn step(label: &str, result: Result<Order, LifecycleError>) -> Result<Order, CommandError> {
    let order = result.map_err(|e| CommandError::InvalidArgument(format!("{label}: {e}")))?;
    info!(
        order = %order.id.reference(),
        status = %order.status,
        delivery = %order.delivery_status,
        verified = order.payment_verified,
        "Order {label}"
    );
    Ok(order)
}
