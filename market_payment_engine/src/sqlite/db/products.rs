use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::LedgerError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, LedgerError> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, title, description, price, status, created_at)
            VALUES ($1, $2, $3, $4, 'Available', $5)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(product.title)
    .bind(product.description)
    .bind(product.price)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product #{} ({}) listed by seller {}", product.id, product.title, product.seller_id);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

/// Marks an available product as sold to `buyer_id`. Returns `None` if the product is not available.
pub async fn mark_sold(
    product_id: i64,
    buyer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
            UPDATE products SET status = 'Sold', buyer_id = $1, sold_at = $2
            WHERE id = $3 AND status = 'Available'
            RETURNING *;
        "#,
    )
    .bind(buyer_id)
    .bind(now)
    .bind(product_id)
    .fetch_optional(conn)
    .await
}
