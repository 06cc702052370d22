use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::FromRow;
use std::sync::Arc;

use crate::db::{
    Bid, BidResponse, BidWithUser, DbPool, ListBidsResponse, PlaceBidRequest, Product,
    UserSummary,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, AppJson};
use super::validation::{parse_product_id, validate_bid_amount};

/// Bid row joined with the bidder's name
#[derive(FromRow)]
struct BidRow {
    id: i64,
    amount: f64,
    product_id: i64,
    user_id: i64,
    created_at: String,
    user_name: String,
}

/// All bids for a product, highest amount first. An unknown product simply
/// has no bids, so the result is empty rather than an error.
pub async fn bids_for_product(
    pool: &DbPool,
    product_id: i64,
) -> Result<Vec<BidWithUser>, ApiError> {
    let rows: Vec<BidRow> = sqlx::query_as(
        "SELECT b.id, b.amount, b.product_id, b.user_id, b.created_at, u.name AS user_name \
         FROM bids b JOIN users u ON b.user_id = u.id \
         WHERE b.product_id = ? ORDER BY b.amount DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|b| BidWithUser {
            id: b.id,
            amount: b.amount,
            product_id: b.product_id,
            user_id: b.user_id,
            created_at: b.created_at,
            user: UserSummary {
                id: b.user_id,
                name: b.user_name,
            },
        })
        .collect())
}

/// Record a bid, enforcing the monotonic highest-bid invariant.
///
/// The read-max/validate/insert sequence runs in one transaction so two
/// concurrent bids cannot both pass the highest-bid check; an early return
/// drops the transaction and rolls it back.
pub async fn record_bid(
    pool: &DbPool,
    product_id: i64,
    user_id: i64,
    amount: f64,
) -> Result<Bid, ApiError> {
    let mut tx = pool.begin().await?;

    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;
    let product = product.ok_or_else(|| ApiError::not_found("Product not found"))?;

    let highest: Option<f64> =
        sqlx::query_scalar("SELECT MAX(amount) FROM bids WHERE product_id = ?")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
    let current_highest = highest.unwrap_or(product.starting_bid);

    // Strict comparison: a tie is rejected
    if amount <= current_highest {
        return Err(ApiError::bad_request(format!(
            "Bid must be higher than current highest ({})",
            current_highest
        )));
    }

    let result = sqlx::query("INSERT INTO bids (amount, product_id, user_id) VALUES (?, ?, ?)")
        .bind(amount)
        .bind(product_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let bid: Bid = sqlx::query_as("SELECT * FROM bids WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(product_id, user_id, amount, "Bid accepted");

    Ok(bid)
}

/// List bids for a product, highest first
///
/// GET /products/:id/bids
pub async fn list_bids(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListBidsResponse>, ApiError> {
    let product_id = parse_product_id(&id).map_err(ApiError::bad_request)?;

    let bids = bids_for_product(&state.db, product_id).await?;
    Ok(Json(ListBidsResponse { bids }))
}

/// Place a bid (auth required)
///
/// POST /products/:id/bids
pub async fn place_bid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<PlaceBidRequest>,
) -> Result<(StatusCode, Json<BidResponse>), ApiError> {
    let product_id = parse_product_id(&id).map_err(ApiError::bad_request)?;
    validate_bid_amount(request.amount).map_err(ApiError::bad_request)?;

    let bid = record_bid(&state.db, product_id, user.id, request.amount).await?;

    Ok((StatusCode::CREATED, Json(BidResponse { bid })))
}
