use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use realdeal_db::models::ListingFilter;
use realdeal_types::api::{SuccessResponse, UpdateListingRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, db_call};
use crate::extract::{JsonBody, QueryParams};
use crate::listings::{
    apply_patch, fetch_listing, parse_listing_id, patch_from_request, remove_listing,
};

// Every handler here sits behind `middleware::require_admin`.

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub id: Option<String>,
}

impl AdminQuery {
    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    fn required_id(&self) -> Result<Uuid, ApiError> {
        let raw = self.id().ok_or_else(|| ApiError::bad_request("Listing ID is required"))?;
        parse_listing_id(raw)
    }
}

/// GET /api/admin/listings: every listing, active or not, or one by `id`.
pub async fn list_listings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AdminQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = query.id() {
        let row = fetch_listing(&state, parse_listing_id(raw)?).await?;
        return Ok(Json(convert::listing(row)).into_response());
    }

    let filter = ListingFilter { include_inactive: true, ..Default::default() };
    let rows = db_call(&state, move |db| db.find_listings(&filter)).await?;
    let listings: Vec<_> = rows.into_iter().map(convert::listing).collect();
    Ok(Json(listings).into_response())
}

pub async fn update_listing(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AdminQuery>,
    JsonBody(req): JsonBody<UpdateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query.required_id()?;
    fetch_listing(&state, id).await?;
    let patch = patch_from_request(&state, req).await?;
    let row = apply_patch(&state, id, patch).await?;
    info!("Admin updated listing {}", id);
    Ok(Json(convert::listing(row)))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AdminQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query.required_id()?;
    remove_listing(&state, id).await?;
    info!("Admin deleted listing {}", id);
    Ok(Json(SuccessResponse { success: true }))
}
