use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    models::{normalize_page_limit, PageQuery, PaginationMeta, ProductResponse},
    queries::{category_queries, product_queries},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub meta: PaginationMeta,
}

pub async fn get_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ProductListResponse>> {
    let (page, limit) = normalize_page_limit(query.page, query.limit);

    let total = product_queries::count_active(&state.db).await?;
    let products = product_queries::get_active(&state.db, (page - 1) * limit, limit).await?;

    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let mut images = product_queries::find_images_by_product_ids(&state.db, &product_ids).await?;

    let category_ids: Vec<i32> = products.iter().map(|p| p.category_id).collect();
    let categories = category_queries::find_by_ids(&state.db, &category_ids).await?;

    let mut responses = Vec::with_capacity(products.len());
    for product in products {
        let category = categories
            .get(&product.category_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

        let images = images.remove(&product.id).unwrap_or_default();

        responses.push(ProductResponse {
            product,
            category,
            images,
        });
    }

    Ok(Json(ProductListResponse {
        products: responses,
        meta: PaginationMeta::new(page, limit, total),
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<ProductResponse>> {
    let product = product_queries::find_by_id(&state.db, product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let category = category_queries::find_by_id(&state.db, product.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let images = product_queries::find_images_by_product_ids(&state.db, &[product.id])
        .await?
        .remove(&product.id)
        .unwrap_or_default();

    Ok(Json(ProductResponse {
        product,
        category,
        images,
    }))
}
