use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{Cart, Order, OrderItem},
    queries::product_queries,
};

#[derive(Debug, sqlx::FromRow)]
struct OrderLine {
    product_id: i32,
    quantity: i32,
    name: String,
    price: Decimal,
}

/// Turns the user's cart into an order as one all-or-nothing unit:
/// load cart lines, reserve stock per line, materialize the order with
/// snapshot line items, clear the cart. Any failure rolls back every
/// effect, including stock already reserved for earlier lines.
pub async fn place_order(pool: &PgPool, user_id: i32) -> Result<Order> {
    let mut tx = pool.begin().await?;

    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    // Stable line order keeps stock-row lock acquisition deterministic,
    // concurrent multi-line orders cannot deadlock on each other
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT ci.product_id, ci.quantity, p.name, p.price
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.cart_id = $1
         ORDER BY ci.id",
    )
    .bind(cart.id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        tx.rollback().await?;
        return Err(AppError::EmptyCart);
    }

    let mut total_amount = Decimal::ZERO;

    for line in &lines {
        let reserved =
            product_queries::reserve_stock(&mut *tx, line.product_id, line.quantity).await?;

        if !reserved {
            tx.rollback().await?;
            return Err(AppError::InsufficientStock(line.name.clone()));
        }

        total_amount += line.price * Decimal::from(line.quantity);
    }

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (user_id, status, total_amount)
         VALUES ($1, 'pending', $2) RETURNING *",
    )
    .bind(user_id)
    .bind(total_amount)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
    // line price is the frozen item total, immune to later catalog edits
    let prices: Vec<Decimal> = lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .collect();

    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, price)
         SELECT $1, unnest($2::int[]), unnest($3::int[]), unnest($4::numeric[])",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&prices)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(order)
}

pub async fn find_by_user_and_id(
    pool: &PgPool,
    user_id: i32,
    order_id: i32,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn get_user_orders(
    pool: &PgPool,
    user_id: i32,
    offset: i64,
    limit: i64,
) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1
         ORDER BY created_at DESC OFFSET $2 LIMIT $3",
    )
    .bind(user_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn count_user_orders(pool: &PgPool, user_id: i32) -> Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(total)
}

pub async fn get_items_for_orders(pool: &PgPool, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    Ok(items)
}
