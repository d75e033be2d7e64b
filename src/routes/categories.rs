use axum::{extract::State, Json};

use crate::{error::Result, models::Category, queries::category_queries, AppState};

pub async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = category_queries::get_active(&state.db).await?;

    Ok(Json(categories))
}
