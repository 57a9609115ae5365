//! Catalog API handlers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use supplyhub_core::{Actor, ProductId};

use crate::{
    db::Store,
    error::AppError,
    middleware::RequireActor,
    models::{NewProduct, Product, ProductFilter, ProductUpdate},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: u32 = 100;
const MAX_PAGE_SIZE: u32 = 500;

/// Build the products router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/api/products",
            get(list_products::<S>).post(create_product::<S>),
        )
        .route("/api/products/{id}", patch(update_product::<S>))
}

/// Query parameters for the catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListProductsQuery {
    fn into_filter(self) -> ProductFilter {
        ProductFilter {
            search: self.search,
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// Response for the catalog listing.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Response with a single product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

/// Search the catalog.
///
/// # Errors
///
/// Returns an error if the query string is invalid or the store fails.
pub async fn list_products<S: Store>(
    RequireActor(_actor): RequireActor,
    State(state): State<AppState<S>>,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<ProductsResponse>, AppError> {
    let Query(query) = query?;
    let filter = query.into_filter();
    let (products, total) = state.store().list_products(&filter).await?;

    let limit = i64::from(filter.limit);
    Ok(Json(ProductsResponse {
        products,
        pagination: Pagination {
            page: filter.page,
            limit: filter.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        },
    }))
}

/// Create a catalog product.
///
/// # Errors
///
/// Returns 403 for customers and 400 for a blank name or negative stock.
pub async fn create_product<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    require_staff(actor)?;
    let Json(mut input) = body?;

    input.name = input.name.trim().to_string();
    if input.name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if input.quantity < 0 {
        return Err(AppError::BadRequest(
            "quantity must not be negative".to_string(),
        ));
    }

    let product = state.store().create_product(&input).await?;
    info!(product_id = %product.id, actor = %actor.id, "Product created");
    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// Update a product's name, description, price or stock.
///
/// Existing orders keep their total.
///
/// # Errors
///
/// Returns 403 for customers, 404 if the product does not exist, and 400 for
/// a blank name or negative stock.
pub async fn update_product<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<ProductId>, PathRejection>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<ProductResponse>, AppError> {
    require_staff(actor)?;
    let Path(id) = path?;
    let Json(mut update) = body?;

    if let Some(name) = update.name.take() {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".to_string()));
        }
        update.name = Some(name);
    }
    if update.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest(
            "quantity must not be negative".to_string(),
        ));
    }

    let product = state
        .store()
        .update_product(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    info!(product_id = %id, actor = %actor.id, "Product updated");
    Ok(Json(ProductResponse { product }))
}

fn require_staff(actor: Actor) -> Result<(), AppError> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only staff may manage the catalog".to_string(),
        ))
    }
}
