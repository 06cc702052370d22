use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::FromRow;
use std::sync::Arc;

use crate::db::{
    CreateProductRequest, DbPool, HighestBid, ListProductsResponse, Product,
    ProductDetailResponse, ProductResponse, ProductSummary, UserSummary,
};
use crate::AppState;

use super::auth::CurrentUser;
use super::error::{ApiError, AppJson};
use super::validation::{
    parse_product_id, validate_description, validate_image_url, validate_starting_bid,
    validate_title,
};

/// Product row joined with its owner's name
#[derive(FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    description: String,
    starting_bid: f64,
    image_url: Option<String>,
    owner_id: i64,
    created_at: String,
    owner_name: String,
}

/// Highest bid row joined with the bidder's name
#[derive(FromRow)]
struct TopBidRow {
    id: i64,
    amount: f64,
    user_id: i64,
    user_name: String,
}

fn summarize(row: ProductRow, highest_bid: Option<HighestBid>) -> ProductSummary {
    ProductSummary {
        id: row.id,
        title: row.title,
        description: row.description,
        starting_bid: row.starting_bid,
        image_url: row.image_url,
        created_at: row.created_at,
        owner: UserSummary {
            id: row.owner_id,
            name: row.owner_name,
        },
        highest_bid,
    }
}

/// The product's current top bid with the bidder's identity, if any
async fn top_bid(pool: &DbPool, product_id: i64) -> Result<Option<HighestBid>, ApiError> {
    let row: Option<TopBidRow> = sqlx::query_as(
        "SELECT b.id, b.amount, b.user_id, u.name AS user_name \
         FROM bids b JOIN users u ON b.user_id = u.id \
         WHERE b.product_id = ? ORDER BY b.amount DESC LIMIT 1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|b| HighestBid {
        id: b.id,
        amount: b.amount,
        user: UserSummary {
            id: b.user_id,
            name: b.user_name,
        },
    }))
}

/// All products, newest first, annotated with owner and current highest bid.
pub async fn list_with_highest_bids(pool: &DbPool) -> Result<Vec<ProductSummary>, ApiError> {
    let rows: Vec<ProductRow> = sqlx::query_as(
        "SELECT p.id, p.title, p.description, p.starting_bid, p.image_url, \
                p.owner_id, p.created_at, u.name AS owner_name \
         FROM products p JOIN users u ON p.owner_id = u.id \
         ORDER BY p.created_at DESC, p.id DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut products = Vec::with_capacity(rows.len());
    for row in rows {
        let highest_bid = top_bid(pool, row.id).await?;
        products.push(summarize(row, highest_bid));
    }

    Ok(products)
}

/// A single product with the same annotation, or None if it doesn't exist.
pub async fn product_with_highest_bid(
    pool: &DbPool,
    product_id: i64,
) -> Result<Option<ProductSummary>, ApiError> {
    let row: Option<ProductRow> = sqlx::query_as(
        "SELECT p.id, p.title, p.description, p.starting_bid, p.image_url, \
                p.owner_id, p.created_at, u.name AS owner_name \
         FROM products p JOIN users u ON p.owner_id = u.id \
         WHERE p.id = ?",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let highest_bid = top_bid(pool, row.id).await?;
            Ok(Some(summarize(row, highest_bid)))
        }
        None => Ok(None),
    }
}

/// Insert a product owned by the given user.
pub async fn insert_product(
    pool: &DbPool,
    owner_id: i64,
    title: &str,
    description: &str,
    starting_bid: f64,
    image_url: Option<&str>,
) -> Result<Product, ApiError> {
    let result = sqlx::query(
        "INSERT INTO products (title, description, starting_bid, image_url, owner_id) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(description)
    .bind(starting_bid)
    .bind(image_url)
    .bind(owner_id)
    .execute(pool)
    .await?;

    let product: Product = sqlx::query_as("SELECT * FROM products WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    tracing::info!(product_id = product.id, owner_id, "Product listed");

    Ok(product)
}

/// List all products with their current highest bid
///
/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let products = list_with_highest_bids(&state.db).await?;
    Ok(Json(ListProductsResponse { products }))
}

/// Create a product (auth required)
///
/// POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let Some(starting_bid) = request.starting_bid else {
        return Err(ApiError::bad_request("Missing fields"));
    };
    if request.title.is_empty() || request.description.is_empty() {
        return Err(ApiError::bad_request("Missing fields"));
    }

    validate_title(&request.title).map_err(ApiError::validation)?;
    validate_description(&request.description).map_err(ApiError::validation)?;
    validate_starting_bid(starting_bid).map_err(ApiError::validation)?;
    validate_image_url(&request.image_url).map_err(ApiError::validation)?;

    let product = insert_product(
        &state.db,
        user.id,
        &request.title,
        &request.description,
        starting_bid,
        request.image_url.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// Get a single product with its current highest bid
///
/// GET /products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product_id = parse_product_id(&id).map_err(ApiError::bad_request)?;

    let product = product_with_highest_bid(&state.db, product_id).await?;

    // Not found is null, not an error: callers render a not-found view
    Ok(Json(ProductDetailResponse { product }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed_user(pool: &DbPool, name: &str, email: &str) -> i64 {
        sqlx::query("INSERT INTO users (name, email, password_hash) VALUES (?, ?, 'x')")
            .bind(name)
            .bind(email)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_insert_and_get_product() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "Ant", "ant@example.com").await;

        let product = insert_product(&pool, owner, "Lamp", "A lamp", 10.0, None)
            .await
            .unwrap();
        assert_eq!(product.title, "Lamp");
        assert_eq!(product.starting_bid, 10.0);
        assert_eq!(product.owner_id, owner);
        assert!(product.image_url.is_none());

        let detail = product_with_highest_bid(&pool, product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.owner.name, "Ant");
        assert!(detail.highest_bid.is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_product_is_none() {
        let pool = test_pool().await;
        assert!(product_with_highest_bid(&pool, 999)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_highest_bid() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "Ant", "ant@example.com").await;
        let bidder = seed_user(&pool, "Bee", "bee@example.com").await;

        let first = insert_product(&pool, owner, "Lamp", "A lamp", 10.0, None)
            .await
            .unwrap();
        let second = insert_product(&pool, owner, "Chair", "A chair", 25.0, None)
            .await
            .unwrap();

        sqlx::query("INSERT INTO bids (amount, product_id, user_id) VALUES (?, ?, ?)")
            .bind(12.5)
            .bind(first.id)
            .bind(bidder)
            .execute(&pool)
            .await
            .unwrap();

        let products = list_with_highest_bids(&pool).await.unwrap();
        assert_eq!(products.len(), 2);

        // Newest first
        assert_eq!(products[0].id, second.id);
        assert_eq!(products[1].id, first.id);

        assert!(products[0].highest_bid.is_none());
        let highest = products[1].highest_bid.as_ref().unwrap();
        assert_eq!(highest.amount, 12.5);
        assert_eq!(highest.user.name, "Bee");
    }
}
