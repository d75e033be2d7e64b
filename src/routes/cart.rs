use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    error::{AppError, Result},
    models::{
        AddToCartRequest, Cart, CartItemResponse, CartResponse, ProductSummary,
        UpdateCartItemRequest,
    },
    queries::{cart_queries, category_queries, product_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
    AppState,
};

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartResponse>> {
    let user_id = extract_user_id(&claims)?;

    let cart = cart_queries::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    Ok(Json(build_cart_response(&state.db, cart).await?))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let user_id = extract_user_id(&claims)?;

    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if !product.is_active {
        return Err(AppError::BadRequest("Product is unavailable".to_string()));
    }

    let cart = cart_queries::get_or_create(&state.db, user_id).await?;

    // Stock is read live at mutation time; it may have changed since the
    // cart was last rendered
    match cart_queries::find_item_by_product(&state.db, cart.id, product.id).await? {
        Some(item) => {
            let new_quantity = item.quantity + payload.quantity;
            if product.stock < new_quantity {
                return Err(AppError::InsufficientStock(product.name));
            }
            cart_queries::set_item_quantity(&state.db, item.id, new_quantity).await?;
        }
        None => {
            if product.stock < payload.quantity {
                return Err(AppError::InsufficientStock(product.name));
            }
            cart_queries::insert_item(&state.db, cart.id, product.id, payload.quantity).await?;
        }
    }

    Ok(Json(build_cart_response(&state.db, cart).await?))
}

pub async fn update_cart_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<i32>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>> {
    let user_id = extract_user_id(&claims)?;

    // Removal is the only way to reach zero
    if payload.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let item = cart_queries::find_item_for_user(&state.db, item_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

    let product = product_queries::find_by_id(&state.db, item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if product.stock < payload.quantity {
        return Err(AppError::InsufficientStock(product.name));
    }

    cart_queries::set_item_quantity(&state.db, item.id, payload.quantity).await?;

    let cart = cart_queries::find_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    Ok(Json(build_cart_response(&state.db, cart).await?))
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<i32>,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    let removed = cart_queries::remove_item(&state.db, user_id, item_id).await?;

    if removed == 0 {
        return Err(AppError::NotFound("Cart item not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn build_cart_response(pool: &PgPool, cart: Cart) -> Result<CartResponse> {
    let items = cart_queries::get_items(pool, cart.id).await?;

    let product_ids: Vec<i32> = items.iter().map(|i| i.product_id).collect();
    let products = product_queries::find_by_ids(pool, &product_ids).await?;

    let category_ids: Vec<i32> = products.values().map(|p| p.category_id).collect();
    let categories = category_queries::find_by_ids(pool, &category_ids).await?;

    let mut cart_items = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;

    for item in items {
        let product = products
            .get(&item.product_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let category = categories
            .get(&product.category_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let subtotal = product.price * Decimal::from(item.quantity);
        total += subtotal;

        cart_items.push(CartItemResponse {
            id: item.id,
            product: ProductSummary { product, category },
            quantity: item.quantity,
            subtotal,
            created_at: item.created_at,
            updated_at: item.updated_at,
        });
    }

    Ok(CartResponse {
        id: cart.id,
        user_id: cart.user_id,
        cart_items,
        total,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    })
}
