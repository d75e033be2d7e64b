use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    models::{AuthResponse, RegisterRequest},
    queries::{cart_queries, user_queries},
    routes::tokens,
    AppState,
};

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    validate_registration(&payload)?;

    if user_queries::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = user_queries::create_user(
        &state.db,
        &payload.email,
        &password_hash,
        &payload.first_name,
        &payload.last_name,
        payload.phone.as_deref(),
    )
    .await?;

    // Every user owns exactly one cart; a failure here fails the
    // registration rather than leaving a user without one
    cart_queries::create(&state.db, user.id).await?;

    let response = tokens::issue_auth_response(&state, user).await?;

    Ok(Json(response))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }

    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }

    if payload.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    Ok(())
}
