use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::{
    error::{AppError, Result},
    models::{AuthResponse, LogoutRequest, RefreshTokenRequest, User, UserResponse},
    queries::{token_queries, user_queries},
    services::event_service,
    utils::{extractors::extract_user_id, jwt},
    AppState,
};

/// Rotates a refresh token: the stored record is looked up under a row
/// lock, a brand-new pair is issued and persisted, and only then is the
/// old record deleted, all in one transaction. A replayed old token loses
/// either to the lock or to the lookup.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>> {
    let claims = jwt::verify_token(&state.jwt, &payload.refresh_token)
        .map_err(|_| AppError::InvalidRefreshToken)?;

    let user_id = extract_user_id(&claims).map_err(|_| AppError::InvalidRefreshToken)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;

    let mut tx = state.db.begin().await?;

    let stored = token_queries::find_valid_for_update(&mut tx, &payload.refresh_token)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;

    let (access_token, refresh_token) =
        jwt::generate_token_pair(&state.jwt, user.id, &user.email, user.role)?;

    let expires_at = Utc::now() + chrono::Duration::seconds(state.jwt.refresh_ttl_secs);

    token_queries::create(&mut *tx, user.id, &refresh_token, expires_at).await?;
    token_queries::delete_by_id(&mut tx, stored.id).await?;

    tx.commit().await?;

    let user = UserResponse::from(user);
    publish_login_event(&state, &user);

    Ok(Json(AuthResponse {
        user,
        access_token,
        refresh_token,
    }))
}

pub async fn logout_user(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<StatusCode> {
    let removed = token_queries::delete_by_token(&state.db, &payload.refresh_token).await?;

    if removed == 0 {
        tracing::debug!("Logout with unknown refresh token");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Issues and persists a credential pair for a freshly verified identity
/// (register and login funnel through here).
pub async fn issue_auth_response(state: &AppState, user: User) -> Result<AuthResponse> {
    let (access_token, refresh_token) =
        jwt::generate_token_pair(&state.jwt, user.id, &user.email, user.role)?;

    let expires_at = Utc::now() + chrono::Duration::seconds(state.jwt.refresh_ttl_secs);

    token_queries::create(&state.db, user.id, &refresh_token, expires_at).await?;

    let user = UserResponse::from(user);
    publish_login_event(state, &user);

    Ok(AuthResponse {
        user,
        access_token,
        refresh_token,
    })
}

/// Best-effort: credentials are already issued and persisted, so a publish
/// failure is logged instead of failing the request.
fn publish_login_event(state: &AppState, user: &UserResponse) {
    let payload = match serde_json::to_value(user) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to serialize login event payload: {}", e);
            return;
        }
    };

    let events = state.events.clone();
    tokio::spawn(async move {
        if let Err(e) = events
            .publish(event_service::USER_LOGGED_IN, payload, HashMap::new())
            .await
        {
            tracing::warn!("Failed to publish user login event: {}", e);
        }
    });
}
