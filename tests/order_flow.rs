mod common;

use rust_decimal::dec;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use common::*;
use vela_back::{error::AppError, queries::order_queries};

#[sqlx::test]
async fn placing_an_order_decrements_stock_and_empties_the_cart(pool: PgPool) {
    let user = seed_user(&pool, "buyer@shop.test").await;
    let cart_id = seed_cart(&pool, user.id).await;
    let category = seed_category(&pool, "Peripherals").await;
    let product = seed_product(&pool, category.id, "Trackball", dec!(10.00), 5).await;
    seed_cart_item(&pool, cart_id, product.id, 2).await;

    let order = order_queries::place_order(&pool, user.id)
        .await
        .expect("order");

    assert_eq!(order.user_id, user.id);
    assert_eq!(order.status, "pending");
    assert_eq!(order.total_amount, dec!(20.00));

    assert_eq!(product_stock(&pool, product.id).await, 3);
    assert_eq!(cart_item_count(&pool, cart_id).await, 0);
}

#[sqlx::test]
async fn order_items_freeze_price_at_purchase_time(pool: PgPool) {
    let user = seed_user(&pool, "buyer@shop.test").await;
    let cart_id = seed_cart(&pool, user.id).await;
    let category = seed_category(&pool, "Peripherals").await;
    let product = seed_product(&pool, category.id, "Trackball", dec!(10.00), 5).await;
    seed_cart_item(&pool, cart_id, product.id, 2).await;

    let order = order_queries::place_order(&pool, user.id)
        .await
        .expect("order");

    // a later catalog edit must not touch the snapshot
    sqlx::query("UPDATE products SET price = 99.99 WHERE id = $1")
        .bind(product.id)
        .execute(&pool)
        .await
        .expect("price change");

    let items = order_queries::get_items_for_orders(&pool, &[order.id])
        .await
        .expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, dec!(20.00));
    assert_eq!(items[0].quantity, 2);

    let reloaded = order_queries::find_by_user_and_id(&pool, user.id, order.id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(reloaded.total_amount, dec!(20.00));
}

#[sqlx::test]
async fn ordering_an_empty_cart_fails(pool: PgPool) {
    let user = seed_user(&pool, "buyer@shop.test").await;
    seed_cart(&pool, user.id).await;

    let err = order_queries::place_order(&pool, user.id)
        .await
        .expect_err("must fail");

    assert!(matches!(err, AppError::EmptyCart));
}

#[sqlx::test]
async fn insufficient_stock_rolls_back_every_line(pool: PgPool) {
    let user = seed_user(&pool, "buyer@shop.test").await;
    let cart_id = seed_cart(&pool, user.id).await;
    let category = seed_category(&pool, "Peripherals").await;

    // first line is satisfiable, second is not; the first line's
    // reservation must not survive the failure
    let plenty = seed_product(&pool, category.id, "Keycaps", dec!(5.00), 10).await;
    let scarce = seed_product(&pool, category.id, "Trackball", dec!(10.00), 1).await;
    seed_cart_item(&pool, cart_id, plenty.id, 2).await;
    seed_cart_item(&pool, cart_id, scarce.id, 3).await;

    let err = order_queries::place_order(&pool, user.id)
        .await
        .expect_err("must fail");

    assert!(matches!(err, AppError::InsufficientStock(ref name) if name == "Trackball"));

    assert_eq!(product_stock(&pool, plenty.id).await, 10);
    assert_eq!(product_stock(&pool, scarce.id).await, 1);
    assert_eq!(cart_item_count(&pool, cart_id).await, 2);

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(orders, 0);
}

#[sqlx::test]
async fn concurrent_orders_cannot_oversell(
    pool_opts: PgPoolOptions,
    conn_opts: PgConnectOptions,
) {
    let pool = pool_opts
        .max_connections(5)
        .connect_with(conn_opts)
        .await
        .expect("pool");

    let category = seed_category(&pool, "Peripherals").await;
    let product = seed_product(&pool, category.id, "Trackball", dec!(10.00), 5).await;

    let alice = seed_user(&pool, "alice@shop.test").await;
    let alice_cart = seed_cart(&pool, alice.id).await;
    seed_cart_item(&pool, alice_cart, product.id, 3).await;

    let bob = seed_user(&pool, "bob@shop.test").await;
    let bob_cart = seed_cart(&pool, bob.id).await;
    seed_cart_item(&pool, bob_cart, product.id, 3).await;

    let (first, second) = tokio::join!(
        order_queries::place_order(&pool, alice.id),
        order_queries::place_order(&pool, bob.id),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two contending orders may win");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.expect_err("loser"),
        AppError::InsufficientStock(ref name) if name == "Trackball"
    ));

    assert_eq!(product_stock(&pool, product.id).await, 2);
}

#[sqlx::test]
async fn orders_are_scoped_to_their_owner(pool: PgPool) {
    let alice = seed_user(&pool, "alice@shop.test").await;
    let alice_cart = seed_cart(&pool, alice.id).await;
    let bob = seed_user(&pool, "bob@shop.test").await;
    seed_cart(&pool, bob.id).await;

    let category = seed_category(&pool, "Peripherals").await;
    let product = seed_product(&pool, category.id, "Trackball", dec!(10.00), 5).await;
    seed_cart_item(&pool, alice_cart, product.id, 1).await;

    let order = order_queries::place_order(&pool, alice.id)
        .await
        .expect("order");

    let foreign = order_queries::find_by_user_and_id(&pool, bob.id, order.id)
        .await
        .expect("query");
    assert!(foreign.is_none());
}
