//! Bid models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub amount: f64,
    pub product_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

/// Bid with the bidder's public identity, for list views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidWithUser {
    pub id: i64,
    pub amount: f64,
    pub product_id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub bid: Bid,
}

#[derive(Debug, Serialize)]
pub struct ListBidsResponse {
    pub bids: Vec<BidWithUser>,
}
