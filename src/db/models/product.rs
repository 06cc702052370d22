//! Product models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: f64,
    pub image_url: Option<String>,
    pub owner_id: i64,
    pub created_at: String,
}

/// Product annotated with its owner and current highest bid, for list and
/// detail views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: f64,
    pub image_url: Option<String>,
    pub created_at: String,
    pub owner: UserSummary,
    pub highest_bid: Option<HighestBid>,
}

/// The winning bid attached to a product summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestBid {
    pub id: i64,
    pub amount: f64,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starting_bid: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    pub products: Vec<ProductSummary>,
}
