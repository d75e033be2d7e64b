use std::collections::HashMap;

use sqlx::{PgExecutor, PgPool};

use crate::{
    error::Result,
    models::{CreateProductRequest, Product, ProductImage, UpdateProductRequest},
};

pub async fn create(pool: &PgPool, req: &CreateProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (category_id, name, description, price, stock, sku)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(req.category_id)
    .bind(&req.name)
    .bind(req.description.as_deref().unwrap_or_default())
    .bind(req.price)
    .bind(req.stock)
    .bind(&req.sku)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Product>> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn get_active(pool: &PgPool, offset: i64, limit: i64) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_active = TRUE
         ORDER BY created_at DESC OFFSET $1 LIMIT $2",
    )
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn count_active(pool: &PgPool) -> Result<i64> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM products WHERE is_active = TRUE")
            .fetch_one(pool)
            .await?;

    Ok(total)
}

pub async fn update(pool: &PgPool, id: i32, req: &UpdateProductRequest) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
            category_id = COALESCE($1, category_id),
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            stock = COALESCE($5, stock),
            is_active = COALESCE($6, is_active),
            updated_at = NOW()
         WHERE id = $7 RETURNING *",
    )
    .bind(req.category_id)
    .bind(req.name.as_deref())
    .bind(req.description.as_deref())
    .bind(req.price)
    .bind(req.stock)
    .bind(req.is_active)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Decrements stock only when enough is available. The conditional update is
/// atomic with respect to concurrent reservations: the row lock serializes
/// writers and the `stock >= $1` predicate is re-checked after the lock is
/// acquired. Returns false when stock is insufficient.
pub async fn reserve_stock(
    executor: impl PgExecutor<'_>,
    product_id: i32,
    quantity: i32,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = NOW()
         WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Compensating increment for reservation, used by cancellation paths.
pub async fn release_stock(
    executor: impl PgExecutor<'_>,
    product_id: i32,
    quantity: i32,
) -> Result<()> {
    sqlx::query("UPDATE products SET stock = stock + $1, updated_at = NOW() WHERE id = $2")
        .bind(quantity)
        .bind(product_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn add_image(
    pool: &PgPool,
    product_id: i32,
    url: &str,
    alt_text: &str,
    is_primary: bool,
) -> Result<ProductImage> {
    let image = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (product_id, url, alt_text, is_primary)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(product_id)
    .bind(url)
    .bind(alt_text)
    .bind(is_primary)
    .fetch_one(pool)
    .await?;

    Ok(image)
}

pub async fn find_images_by_product_ids(
    pool: &PgPool,
    ids: &[i32],
) -> Result<HashMap<i32, Vec<ProductImage>>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = ANY($1)
         ORDER BY product_id, is_primary DESC, created_at ASC",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i32, Vec<ProductImage>> = HashMap::new();
    for image in images {
        map.entry(image.product_id).or_default().push(image);
    }

    Ok(map)
}
