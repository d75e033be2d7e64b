use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use crate::{
    config::{AppConfig, JwtConfig, UploadProviderKind},
    database,
    error::Result,
    routes,
    services::{
        event_service::{EventPublisher, SqsEventPublisher},
        upload_service::{LocalUploadProvider, S3UploadProvider, UploadProvider},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: JwtConfig,
    pub uploads: Arc<dyn UploadProvider>,
    pub events: Arc<dyn EventPublisher>,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;

    let uploads: Arc<dyn UploadProvider> = match config.upload.provider {
        UploadProviderKind::Local => Arc::new(LocalUploadProvider::new(&config.upload.path)),
        UploadProviderKind::S3 => Arc::new(S3UploadProvider::new(&config.aws).await?),
    };

    let events: Arc<dyn EventPublisher> = Arc::new(SqsEventPublisher::new(&config.aws).await?);

    let state = AppState {
        db: pool,
        jwt: config.jwt.clone(),
        uploads,
        events,
    };

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                crate::error::AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router(&state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .with_state(state);

    Ok(app)
}
