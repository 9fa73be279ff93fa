use axum::{Json, extract::State, response::IntoResponse};

use realdeal_db::seed::SeedSummary;
use realdeal_types::api::{SeedDetails, SeedResponse};

use crate::auth::{AppState, hash_password};
use crate::error::{ApiError, db_call};

/// Shared password of the seeded demo accounts.
pub const DEMO_PASSWORD: &str = "demo-password";

/// Seeds demo users and listings; a no-op for rows already present.
pub async fn seed(state: &AppState) -> Result<SeedSummary, ApiError> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    db_call(state, move |db| db.seed_demo_data(&password_hash)).await
}

/// GET /api/dummy-data
pub async fn dummy_data(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let summary = seed(&state).await?;
    Ok(Json(SeedResponse {
        success: true,
        message: "Dummy data loaded successfully".to_string(),
        details: SeedDetails {
            categories: summary.categories,
            users: summary.users,
            listings: summary.listings,
            total: summary.categories + summary.users + summary.listings,
        },
    }))
}
