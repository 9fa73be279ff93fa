use axum::{Json, extract::State, response::IntoResponse};

use realdeal_types::models::Category;

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, db_call};

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = db_call(&state, |db| db.list_categories()).await?;
    let categories: Vec<Category> = rows
        .into_iter()
        .map(|row| Category {
            id: convert::uuid(&row.id, "category id"),
            name: row.name,
        })
        .collect();
    Ok(Json(categories))
}
