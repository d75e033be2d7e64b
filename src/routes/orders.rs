use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        normalize_page_limit, Order, OrderItem, OrderItemResponse, OrderListResponse,
        OrderResponse, PageQuery, PaginationMeta, ProductSummary,
    },
    queries::{category_queries, order_queries, product_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
    AppState,
};

pub async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;

    let order = order_queries::place_order(&state.db, user_id).await?;

    let mut responses = build_order_responses(&state.db, vec![order]).await?;

    responses
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::InternalError("Order detail reload failed".to_string()))
}

pub async fn get_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderListResponse>> {
    let user_id = extract_user_id(&claims)?;
    let (page, limit) = normalize_page_limit(query.page, query.limit);

    let total = order_queries::count_user_orders(&state.db, user_id).await?;
    let orders =
        order_queries::get_user_orders(&state.db, user_id, (page - 1) * limit, limit).await?;

    let orders = build_order_responses(&state.db, orders).await?;

    Ok(Json(OrderListResponse {
        orders,
        meta: PaginationMeta::new(page, limit, total),
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_id): Path<i32>,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;

    let order = order_queries::find_by_user_and_id(&state.db, user_id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let mut responses = build_order_responses(&state.db, vec![order]).await?;

    responses
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::InternalError("Order detail load failed".to_string()))
}

async fn build_order_responses(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderResponse>> {
    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let all_items = order_queries::get_items_for_orders(pool, &order_ids).await?;

    let product_ids: Vec<i32> = all_items.iter().map(|i| i.product_id).collect();
    let products = product_queries::find_by_ids(pool, &product_ids).await?;

    let category_ids: Vec<i32> = products.values().map(|p| p.category_id).collect();
    let categories = category_queries::find_by_ids(pool, &category_ids).await?;

    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    let mut responses = Vec::with_capacity(orders.len());

    for order in orders {
        let items = items_map.remove(&order.id).unwrap_or_default();
        let mut order_items = Vec::with_capacity(items.len());

        for item in items {
            let product = products
                .get(&item.product_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

            let category = categories
                .get(&product.category_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

            order_items.push(OrderItemResponse {
                id: item.id,
                product: ProductSummary { product, category },
                quantity: item.quantity,
                // the frozen line total, not the live catalog price
                price: item.price,
                created_at: item.created_at,
            });
        }

        responses.push(OrderResponse {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            order_items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        });
    }

    Ok(responses)
}
