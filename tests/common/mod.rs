#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use vela_back::{
    config::JwtConfig,
    error::Result,
    models::{Category, Product, User},
    services::{event_service::EventPublisher, upload_service::LocalUploadProvider},
    utils::jwt::Claims,
    AppState,
};

/// Event sink that records instead of publishing, so tests can assert on
/// what the auth flow emitted.
pub struct RecordingPublisher {
    pub events: Mutex<Vec<String>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        event_type: &str,
        _payload: serde_json::Value,
        _metadata: HashMap<String, String>,
    ) -> Result<()> {
        self.events.lock().unwrap().push(event_type.to_string());
        Ok(())
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 3600,
    }
}

pub fn test_state(pool: PgPool) -> (AppState, Arc<RecordingPublisher>) {
    let events = RecordingPublisher::new();
    let uploads_dir = std::env::temp_dir().join(format!("vela-test-uploads-{}", Uuid::new_v4()));

    let state = AppState {
        db: pool,
        jwt: test_jwt_config(),
        uploads: Arc::new(LocalUploadProvider::new(uploads_dir)),
        events: events.clone(),
    };

    (state, events)
}

pub fn claims_for(user: &User) -> Claims {
    Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        jti: Uuid::new_v4().to_string(),
        exp: (chrono::Utc::now().timestamp() + 900) as usize,
    }
}

pub async fn seed_user(pool: &PgPool, email: &str) -> User {
    let password_hash = bcrypt::hash("password123", bcrypt::DEFAULT_COST).expect("hash");

    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, first_name, last_name, role)
         VALUES ($1, $2, 'Test', 'User', 'customer') RETURNING *",
    )
    .bind(email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .expect("seed user")
}

pub async fn seed_admin(pool: &PgPool, email: &str) -> User {
    let password_hash = bcrypt::hash("password123", bcrypt::DEFAULT_COST).expect("hash");

    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, first_name, last_name, role)
         VALUES ($1, $2, 'Test', 'Admin', 'admin') RETURNING *",
    )
    .bind(email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .expect("seed admin")
}

pub async fn seed_cart(pool: &PgPool, user_id: i32) -> i32 {
    let (cart_id,): (i32,) =
        sqlx::query_as("INSERT INTO carts (user_id) VALUES ($1) RETURNING id")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("seed cart");

    cart_id
}

pub async fn seed_category(pool: &PgPool, name: &str) -> Category {
    sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, '') RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("seed category")
}

pub async fn seed_product(
    pool: &PgPool,
    category_id: i32,
    name: &str,
    price: Decimal,
    stock: i32,
) -> Product {
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (category_id, name, description, price, stock, sku)
         VALUES ($1, $2, '', $3, $4, $5) RETURNING *",
    )
    .bind(category_id)
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(Uuid::new_v4().to_string())
    .fetch_one(pool)
    .await
    .expect("seed product")
}

pub async fn seed_cart_item(pool: &PgPool, cart_id: i32, product_id: i32, quantity: i32) {
    sqlx::query("INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)")
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .execute(pool)
        .await
        .expect("seed cart item");
}

pub async fn product_stock(pool: &PgPool, product_id: i32) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("stock");

    stock
}

pub async fn cart_item_count(pool: &PgPool, cart_id: i32) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .fetch_one(pool)
        .await
        .expect("count");

    count
}

pub async fn refresh_token_count(pool: &PgPool, user_id: i32) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("count");

    count
}
