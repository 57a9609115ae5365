//! Catalog product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{Price, ProductId};

/// A catalog item with its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Product category (e.g. "Construction Materials").
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Warehouse or site holding the stock.
    pub location: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Current unit price.
    pub price: Price,
    /// Units in stock. Never negative.
    pub quantity: i32,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub quantity: i32,
}

/// Partial update of a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// Filter and pagination for catalog listings.
#[derive(Debug, Clone)]
pub struct ProductFilter {
    /// Case-insensitive match against name or description.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl ProductFilter {
    /// Rows to skip for the requested page.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            limit: 100,
        }
    }
}
