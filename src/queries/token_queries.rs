use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::{error::Result, models::RefreshToken};

pub async fn create(
    executor: impl PgExecutor<'_>,
    user_id: i32,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken> {
    let row = sqlx::query_as::<_, RefreshToken>(
        "INSERT INTO refresh_tokens (user_id, token, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Expired rows are treated as absent.
pub async fn find_valid(pool: &PgPool, token: &str) -> Result<Option<RefreshToken>> {
    let row = sqlx::query_as::<_, RefreshToken>(
        "SELECT * FROM refresh_tokens WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Row-locked variant for the rotation transaction: two concurrent refreshes
/// with the same token serialize here, and the loser sees the row gone.
pub async fn find_valid_for_update(
    conn: &mut PgConnection,
    token: &str,
) -> Result<Option<RefreshToken>> {
    let row = sqlx::query_as::<_, RefreshToken>(
        "SELECT * FROM refresh_tokens WHERE token = $1 AND expires_at > NOW() FOR UPDATE",
    )
    .bind(token)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

pub async fn delete_by_id(conn: &mut PgConnection, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn delete_by_token(pool: &PgPool, token: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
