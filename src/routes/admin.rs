use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        Category, CreateCategoryRequest, CreateProductRequest, Product, ProductImage,
        UpdateCategoryRequest, UpdateProductRequest,
    },
    queries::{category_queries, product_queries},
    services::upload_service,
    AppState,
};

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<Category>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }

    let category = category_queries::create(
        &state.db,
        &payload.name,
        payload.description.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let category = category_queries::update(&state.db, category_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<StatusCode> {
    let removed = category_queries::delete(&state.db, category_id).await?;

    if removed == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<Product>> {
    if payload.price.is_sign_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    if payload.stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }

    category_queries::find_by_id(&state.db, payload.category_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let product = product_queries::create(&state.db, &payload).await?;

    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if payload.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }

    let product = product_queries::update(&state.db, product_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<StatusCode> {
    let removed = product_queries::delete(&state.db, product_id).await?;

    if removed == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ProductImage>> {
    let product = product_queries::find_by_id(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Missing file name".to_string()))?
            .to_string();

        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| upload_service::is_valid_image_ext(ext))
            .ok_or_else(|| AppError::BadRequest(format!("Invalid file type: {}", file_name)))?;

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let key = format!("products/{}/{}.{}", product_id, Uuid::new_v4(), ext);
        let url = state.uploads.upload_file(&data, &content_type, &key).await?;

        // first image becomes the primary one
        let existing = product_queries::find_images_by_product_ids(&state.db, &[product_id])
            .await?
            .remove(&product_id)
            .unwrap_or_default();

        let image = product_queries::add_image(
            &state.db,
            product_id,
            &url,
            &product.name,
            existing.is_empty(),
        )
        .await?;

        return Ok(Json(image));
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}
