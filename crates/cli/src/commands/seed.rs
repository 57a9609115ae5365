//! Seed the database with demo accounts and a starter catalog.
//!
//! Safe to run repeatedly: accounts whose email already exists are skipped,
//! and products are only inserted into an empty catalog.

use rust_decimal::Decimal;
use tracing::info;

use supplyhub_core::{Email, Price, Role};
use supplyhub_server::db::{PgStore, ProductStore, RepositoryError, UserStore};
use supplyhub_server::models::{NewProduct, NewUser, ProductFilter};

use super::{CommandError, connect};

struct SeedUser {
    email: &'static str,
    name: &'static str,
    role: Role,
}

struct SeedProduct {
    name: &'static str,
    kind: &'static str,
    /// Price in cents.
    price_cents: i64,
    quantity: i32,
    location: &'static str,
    description: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "superadmin@example.com",
        name: "Super Admin",
        role: Role::SuperAdmin,
    },
    SeedUser {
        email: "admin@example.com",
        name: "Admin User",
        role: Role::Admin,
    },
    SeedUser {
        email: "user@example.com",
        name: "Purchasing Organization",
        role: Role::User,
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Industrial Steel Pipes",
        kind: "Construction Materials",
        price_cents: 150_000,
        quantity: 500,
        location: "Warehouse A - City Center",
        description: "High-quality steel pipes for industrial use",
    },
    SeedProduct {
        name: "Cement Bags (50kg)",
        kind: "Construction Materials",
        price_cents: 850,
        quantity: 10_000,
        location: "Warehouse B - North District",
        description: "Premium Portland cement",
    },
    SeedProduct {
        name: "Electrical Cables",
        kind: "Electronics",
        price_cents: 4_500,
        quantity: 2_000,
        location: "Warehouse C - East Zone",
        description: "Copper electrical cables, various gauges",
    },
    SeedProduct {
        name: "Paint Buckets (20L)",
        kind: "Chemicals",
        price_cents: 3_500,
        quantity: 1_500,
        location: "Warehouse A - City Center",
        description: "Interior and exterior paint",
    },
    SeedProduct {
        name: "Plywood Sheets",
        kind: "Wood Products",
        price_cents: 2_500,
        quantity: 800,
        location: "Warehouse D - South Area",
        description: "4x8 plywood sheets, various thicknesses",
    },
];

/// Insert the demo accounts and catalog.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);

    let mut created_users = 0;
    for seed in USERS {
        let email = Email::parse(seed.email)
            .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
        let input = NewUser {
            email,
            name: seed.name.to_string(),
            role: seed.role,
            is_approved: true,
        };
        match store.create_user(&input).await {
            Ok(user) => {
                info!(user_id = %user.id, email = seed.email, role = %seed.role, "Created account");
                created_users += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(email = seed.email, "Account already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let (_, existing) = store.list_products(&ProductFilter::default()).await?;
    let mut created_products = 0;
    if existing == 0 {
        for seed in PRODUCTS {
            let price = Price::new(Decimal::new(seed.price_cents, 2))
                .map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
            let product = store
                .create_product(&NewProduct {
                    name: seed.name.to_string(),
                    kind: Some(seed.kind.to_string()),
                    location: Some(seed.location.to_string()),
                    description: Some(seed.description.to_string()),
                    price,
                    quantity: seed.quantity,
                })
                .await?;
            info!(product_id = %product.id, name = seed.name, "Created product");
            created_products += 1;
        }
    } else {
        info!(existing, "Catalog not empty, skipping products");
    }

    info!(
        users = created_users,
        products = created_products,
        "Seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_data_is_valid() {
        for seed in USERS {
            assert!(Email::parse(seed.email).is_ok(), "{}", seed.email);
        }
        assert_eq!(
            USERS.iter().filter(|u| u.role == Role::SuperAdmin).count(),
            1
        );

        for seed in PRODUCTS {
            assert!(seed.quantity >= 0);
            assert!(Price::new(Decimal::new(seed.price_cents, 2)).is_ok());
        }
        assert_eq!(
            Decimal::new(PRODUCTS.first().unwrap().price_cents, 2).to_string(),
            "1500.00"
        );
    }
}
