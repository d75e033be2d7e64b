use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Cart, CartItem},
};

pub async fn find_by_user(pool: &PgPool, user_id: i32) -> Result<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(cart)
}

pub async fn create(pool: &PgPool, user_id: i32) -> Result<Cart> {
    let cart = sqlx::query_as::<_, Cart>("INSERT INTO carts (user_id) VALUES ($1) RETURNING *")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(cart)
}

/// Registration and first add-to-cart can race on lazy creation, so the
/// insert tolerates an existing row for the user.
pub async fn get_or_create(pool: &PgPool, user_id: i32) -> Result<Cart> {
    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id) VALUES ($1)
         ON CONFLICT (user_id) DO UPDATE SET updated_at = carts.updated_at
         RETURNING *",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(cart)
}

pub async fn get_items(pool: &PgPool, cart_id: i32) -> Result<Vec<CartItem>> {
    let items =
        sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY id")
            .bind(cart_id)
            .fetch_all(pool)
            .await?;

    Ok(items)
}

pub async fn find_item_by_product(
    pool: &PgPool,
    cart_id: i32,
    product_id: i32,
) -> Result<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

/// Looks an item up only if it belongs to a cart owned by the given user.
/// Foreign item ids come back as None, indistinguishable from absent rows.
pub async fn find_item_for_user(
    pool: &PgPool,
    item_id: i32,
    user_id: i32,
) -> Result<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "SELECT cart_items.* FROM cart_items
         JOIN carts ON carts.id = cart_items.cart_id
         WHERE cart_items.id = $1 AND carts.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

pub async fn insert_item(
    pool: &PgPool,
    cart_id: i32,
    product_id: i32,
    quantity: i32,
) -> Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (cart_id, product_id, quantity)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn set_item_quantity(pool: &PgPool, item_id: i32, quantity: i32) -> Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items SET quantity = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(quantity)
    .bind(item_id)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

/// Deletes an item only from the calling user's own cart.
pub async fn remove_item(pool: &PgPool, user_id: i32, item_id: i32) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM cart_items
         WHERE id = $1 AND cart_id IN (SELECT id FROM carts WHERE user_id = $2)",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
