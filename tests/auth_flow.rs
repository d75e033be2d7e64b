mod common;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use common::*;
use vela_back::{
    error::AppError,
    models::{LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest, UserRole},
    queries::token_queries,
    routes::{login, register, tokens},
    utils::jwt,
};

fn register_payload(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "password123".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: None,
    }
}

#[sqlx::test]
async fn registration_issues_credentials_and_a_cart(pool: PgPool) {
    let (state, _) = test_state(pool.clone());

    let Json(response) = register::register_user(
        State(state),
        Json(register_payload("new@shop.test")),
    )
    .await
    .expect("register");

    assert_eq!(response.user.email, "new@shop.test");
    assert_eq!(response.user.role, UserRole::Customer);
    assert!(!response.access_token.is_empty());
    assert!(!response.refresh_token.is_empty());

    assert_eq!(refresh_token_count(&pool, response.user.id).await, 1);

    let (carts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts WHERE user_id = $1")
        .bind(response.user.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(carts, 1);
}

#[sqlx::test]
async fn registering_an_existing_email_conflicts(pool: PgPool) {
    let (state, _) = test_state(pool.clone());
    seed_user(&pool, "taken@shop.test").await;

    let err = register::register_user(
        State(state),
        Json(register_payload("taken@shop.test")),
    )
    .await
    .expect_err("must fail");

    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test]
async fn wrong_password_issues_nothing(pool: PgPool) {
    let (state, events) = test_state(pool.clone());
    let user = seed_user(&pool, "buyer@shop.test").await;

    let err = login::login_user(
        State(state),
        Json(LoginRequest {
            email: "buyer@shop.test".to_string(),
            password: "not-the-password".to_string(),
        }),
    )
    .await
    .expect_err("must fail");

    assert!(matches!(err, AppError::InvalidCredentials));
    assert_eq!(refresh_token_count(&pool, user.id).await, 0);
    assert_eq!(events.count(), 0);
}

#[sqlx::test]
async fn unknown_and_inactive_accounts_look_identical(pool: PgPool) {
    let (state, _) = test_state(pool.clone());
    let user = seed_user(&pool, "dormant@shop.test").await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .expect("deactivate");

    for email in ["dormant@shop.test", "ghost@shop.test"] {
        let err = login::login_user(
            State(state.clone()),
            Json(LoginRequest {
                email: email.to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .expect_err("must fail");

        assert!(matches!(err, AppError::InvalidCredentials));
    }
}

#[sqlx::test]
async fn refresh_rotates_the_token_exactly_once(pool: PgPool) {
    let (state, _) = test_state(pool.clone());
    seed_user(&pool, "buyer@shop.test").await;

    let Json(initial) = login::login_user(
        State(state.clone()),
        Json(LoginRequest {
            email: "buyer@shop.test".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .expect("login");

    let Json(rotated) = tokens::refresh_token(
        State(state.clone()),
        Json(RefreshTokenRequest {
            refresh_token: initial.refresh_token.clone(),
        }),
    )
    .await
    .expect("refresh");

    assert_ne!(rotated.refresh_token, initial.refresh_token);

    // the used token is dead
    let err = tokens::refresh_token(
        State(state.clone()),
        Json(RefreshTokenRequest {
            refresh_token: initial.refresh_token.clone(),
        }),
    )
    .await
    .expect_err("must fail");
    assert!(matches!(err, AppError::InvalidRefreshToken));

    // the replacement works, once
    tokens::refresh_token(
        State(state),
        Json(RefreshTokenRequest {
            refresh_token: rotated.refresh_token,
        }),
    )
    .await
    .expect("second rotation");
}

#[sqlx::test]
async fn expired_stored_token_is_rejected(pool: PgPool) {
    let (state, events) = test_state(pool.clone());
    let user = seed_user(&pool, "buyer@shop.test").await;

    // signature-valid token whose server-side record has lapsed
    let (_, refresh) = jwt::generate_token_pair(
        &test_jwt_config(),
        user.id,
        &user.email,
        user.role,
    )
    .expect("pair");

    token_queries::create(&pool, user.id, &refresh, Utc::now() - Duration::hours(1))
        .await
        .expect("store");

    let err = tokens::refresh_token(
        State(state),
        Json(RefreshTokenRequest {
            refresh_token: refresh,
        }),
    )
    .await
    .expect_err("must fail");

    assert!(matches!(err, AppError::InvalidRefreshToken));
    assert_eq!(refresh_token_count(&pool, user.id).await, 1);
    assert_eq!(events.count(), 0);
}

#[sqlx::test]
async fn garbage_token_is_rejected_before_any_lookup(pool: PgPool) {
    let (state, _) = test_state(pool.clone());

    let err = tokens::refresh_token(
        State(state),
        Json(RefreshTokenRequest {
            refresh_token: "not.a.jwt".to_string(),
        }),
    )
    .await
    .expect_err("must fail");

    assert!(matches!(err, AppError::InvalidRefreshToken));
}

#[sqlx::test]
async fn logout_revokes_the_refresh_token(pool: PgPool) {
    let (state, _) = test_state(pool.clone());
    seed_user(&pool, "buyer@shop.test").await;

    let Json(session) = login::login_user(
        State(state.clone()),
        Json(LoginRequest {
            email: "buyer@shop.test".to_string(),
            password: "password123".to_string(),
        }),
    )
    .await
    .expect("login");

    let status = tokens::logout_user(
        State(state.clone()),
        Json(LogoutRequest {
            refresh_token: session.refresh_token.clone(),
        }),
    )
    .await
    .expect("logout");
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = tokens::refresh_token(
        State(state.clone()),
        Json(RefreshTokenRequest {
            refresh_token: session.refresh_token.clone(),
        }),
    )
    .await
    .expect_err("must fail");
    assert!(matches!(err, AppError::InvalidRefreshToken));

    // logging out twice is harmless
    let status = tokens::logout_user(
        State(state),
        Json(LogoutRequest {
            refresh_token: session.refresh_token,
        }),
    )
    .await
    .expect("logout");
    assert_eq!(status, StatusCode::NO_CONTENT);
}
