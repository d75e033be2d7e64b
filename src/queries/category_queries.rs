use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Category, UpdateCategoryRequest},
};

pub async fn create(pool: &PgPool, name: &str, description: &str) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(category)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(category)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

pub async fn get_active(pool: &PgPool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE is_active = TRUE ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn update(
    pool: &PgPool,
    id: i32,
    req: &UpdateCategoryRequest,
) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
         WHERE id = $4 RETURNING *",
    )
    .bind(req.name.as_deref())
    .bind(req.description.as_deref())
    .bind(req.is_active)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(category)
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
