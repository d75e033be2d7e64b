use axum::{extract::State, Extension, Json};

use crate::{
    error::{AppError, Result},
    models::{UpdateProfileRequest, UserResponse},
    queries::user_queries,
    utils::{extractors::extract_user_id, jwt::Claims},
    AppState,
};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::update_profile(&state.db, user_id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
