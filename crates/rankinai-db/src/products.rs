//! Database operations for `products`.

use chrono::{DateTime, Utc};
use rankinai_core::{NewProduct, Product, ProductStatsUpdate};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, shop_id, external_id, title, handle, description, vendor, \
     product_type, category, price, tags, citation_rate, chatgpt_rate, gemini_rate, \
     total_scans, last_scan_at, last_optimized_at, created_at, updated_at";

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub shop_id: i64,
    pub external_id: String,
    pub title: String,
    pub handle: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub tags: Vec<String>,
    pub citation_rate: f64,
    pub chatgpt_rate: f64,
    pub gemini_rate: f64,
    pub total_scans: i32,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub last_optimized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            shop_id: row.shop_id,
            external_id: row.external_id,
            title: row.title,
            handle: row.handle,
            description: row.description,
            vendor: row.vendor,
            product_type: row.product_type,
            category: row.category,
            price: row.price,
            tags: row.tags,
            citation_rate: row.citation_rate,
            chatgpt_rate: row.chatgpt_rate,
            gemini_rate: row.gemini_rate,
            total_scans: row.total_scans,
            last_scan_at: row.last_scan_at,
            last_optimized_at: row.last_optimized_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fetches a product by primary key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Product::from))
}

/// Lists a shop's products ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_for_shop(pool: &PgPool, shop_id: i64) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = $1 ORDER BY id"
    ))
    .bind(shop_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

/// Upserts a product from the catalog sync.
///
/// Conflicts on `(shop_id, external_id)` update catalog fields only; the
/// cached statistics are left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(
    pool: &PgPool,
    shop_id: i64,
    product: &NewProduct,
) -> Result<Product, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (shop_id, external_id, title, handle, description, vendor, \
              product_type, category, price, tags) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (shop_id, external_id) DO UPDATE SET \
             title        = EXCLUDED.title, \
             handle       = EXCLUDED.handle, \
             description  = EXCLUDED.description, \
             vendor       = EXCLUDED.vendor, \
             product_type = EXCLUDED.product_type, \
             category     = EXCLUDED.category, \
             price        = EXCLUDED.price, \
             tags         = EXCLUDED.tags, \
             updated_at   = NOW() \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(shop_id)
    .bind(&product.external_id)
    .bind(&product.title)
    .bind(&product.handle)
    .bind(&product.description)
    .bind(&product.vendor)
    .bind(&product.product_type)
    .bind(&product.category)
    .bind(product.price)
    .bind(&product.tags)
    .fetch_one(pool)
    .await?;
    Ok(Product::from(row))
}

/// Overwrites the cached statistics with a fresh recomputation.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product_stats(
    pool: &PgPool,
    product_id: i64,
    stats: &ProductStatsUpdate,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET \
             citation_rate = $2, \
             chatgpt_rate  = $3, \
             gemini_rate   = $4, \
             total_scans   = $5, \
             last_scan_at  = $6, \
             updated_at    = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(stats.citation_rate)
    .bind(stats.chatgpt_rate)
    .bind(stats.gemini_rate)
    .bind(stats.total_scans)
    .bind(stats.last_scan_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stamps `last_optimized_at` on a product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_product_optimized(
    pool: &PgPool,
    product_id: i64,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products SET last_optimized_at = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(product_id)
    .bind(at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
