use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    error::{AppError, Result},
    models::UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
    pub exp: usize,
}

/// Issues an access/refresh pair for a verified identity. The access token is
/// honored purely on signature; the refresh token must also exist in the
/// refresh_tokens table to be accepted.
pub fn generate_token_pair(
    config: &JwtConfig,
    user_id: i32,
    email: &str,
    role: UserRole,
) -> Result<(String, String)> {
    let access = sign_token(config, user_id, email, role, config.access_ttl_secs)?;
    let refresh = sign_token(config, user_id, email, role, config.refresh_ttl_secs)?;

    Ok((access, refresh))
}

fn sign_token(
    config: &JwtConfig,
    user_id: i32,
    email: &str,
    role: UserRole,
    ttl_secs: i64,
) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(ttl_secs))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        // jti keeps otherwise-identical tokens distinct, the refresh token
        // column has a unique constraint
        jti: Uuid::new_v4().to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}
