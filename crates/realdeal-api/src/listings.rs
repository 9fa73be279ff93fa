use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use realdeal_db::models::{ListingFilter, ListingPatch, ListingRow, NewListing};
use realdeal_db::seed::PLACEHOLDER_IMAGE;
use realdeal_types::api::{
    CreateListingRequest, ListingStatusRequest, SuccessResponse, UpdateListingRequest,
};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, db_call};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::CurrentUser;

const DEFAULT_CONDITION: &str = "Good";
const DEFAULT_LOCATION: &str = "Unknown";
const MAX_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub id: Option<String>,
    /// Category name.
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub condition: Option<String>,
    pub seller_id: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl ListingQuery {
    fn into_filter(self) -> ListingFilter {
        let non_empty = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        // A seller's own page shows their inactive listings too
        let include_inactive = self.seller_id.is_some();
        ListingFilter {
            category: non_empty(self.category),
            category_id: self.category_id.map(|id| id.to_string()),
            min_price: self.min_price,
            max_price: self.max_price,
            condition: non_empty(self.condition),
            seller_id: self.seller_id.map(|id| id.to_string()),
            search: non_empty(self.search),
            include_inactive,
            limit: self.limit.map(|l| l.min(MAX_LIMIT)),
        }
    }
}

/// GET /api/listings: filtered browse, or one listing when `id` is given.
pub async fn list_listings(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListingQuery>,
) -> Result<Response, ApiError> {
    if let Some(raw) = query.id.as_deref().filter(|id| !id.trim().is_empty()) {
        let row = fetch_listing(&state, parse_listing_id(raw)?).await?;
        return Ok(Json(convert::listing(row)).into_response());
    }

    let filter = query.into_filter();
    let rows = db_call(&state, move |db| db.find_listings(&filter)).await?;
    let listings: Vec<_> = rows.into_iter().map(convert::listing).collect();
    Ok(Json(listings).into_response())
}

pub async fn get_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_listing(&state, parse_listing_id(&id)?).await?;
    Ok(Json(convert::listing(row)))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    JsonBody(req): JsonBody<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = non_blank(req.title);
    let description = non_blank(req.description);
    let category_id = non_blank(req.category_id);
    let (Some(title), Some(description), Some(price), Some(category_id)) =
        (title, description, req.price, category_id)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let price = price
        .value()
        .ok_or_else(|| ApiError::bad_request("Price must be a positive number"))?;
    ensure_category(&state, &category_id).await?;

    let images = match req.images {
        Some(images) if !images.is_empty() => images,
        _ => vec![PLACEHOLDER_IMAGE.to_string()],
    };
    let condition = non_blank(req.condition).unwrap_or_else(|| DEFAULT_CONDITION.to_string());
    let location = non_blank(req.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let listing_id = Uuid::new_v4();
    let id = listing_id.to_string();
    let seller_id = user.id.clone();
    let row = db_call(&state, move |db| {
        db.create_listing(&NewListing {
            id: &id,
            title: &title,
            description: &description,
            price,
            images: &images,
            condition: &condition,
            location: &location,
            seller_id: &seller_id,
            category_id: &category_id,
        })?;
        db.get_listing(&id)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("listing {} missing after insert", listing_id)))?;

    info!("Listing {} created by {}", listing_id, user.email);
    Ok((StatusCode::CREATED, Json(convert::listing(row))))
}

/// PATCH /api/listings/{id}: owner-only partial update.
pub async fn update_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    Extension(user): Extension<CurrentUser>,
    JsonBody(req): JsonBody<UpdateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&id)?;
    fetch_owned_listing(&state, id, &user).await?;
    let patch = patch_from_request(&state, req).await?;
    let row = apply_patch(&state, id, patch).await?;
    Ok(Json(convert::listing(row)))
}

/// PATCH /api/listings/{id}/status: mark sold or (in)active.
pub async fn update_status(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    Extension(user): Extension<CurrentUser>,
    JsonBody(req): JsonBody<ListingStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&id)?;
    if req.is_sold.is_none() && req.is_active.is_none() {
        return Err(ApiError::bad_request("Invalid status value"));
    }
    fetch_owned_listing(&state, id, &user).await?;

    let patch = ListingPatch {
        is_sold: req.is_sold,
        is_active: req.is_active,
        ..Default::default()
    };
    let row = apply_patch(&state, id, patch).await?;
    info!("Listing {} status changed by {} (sold={})", id, user.email, row.is_sold);
    Ok(Json(convert::listing(row)))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    PathParam(id): PathParam<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_listing_id(&id)?;
    fetch_owned_listing(&state, id, &user).await?;
    remove_listing(&state, id).await?;
    info!("Listing {} deleted by {}", id, user.email);
    Ok(Json(SuccessResponse { success: true }))
}

// -- Shared with the admin handlers --

/// A listing id that is not a UUID cannot name any listing.
pub(crate) fn parse_listing_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found("Listing not found"))
}

pub(crate) async fn fetch_listing(state: &AppState, id: Uuid) -> Result<ListingRow, ApiError> {
    db_call(state, move |db| db.get_listing(&id.to_string()))
        .await?
        .ok_or_else(|| ApiError::not_found("Listing not found"))
}

async fn fetch_owned_listing(
    state: &AppState,
    id: Uuid,
    user: &CurrentUser,
) -> Result<ListingRow, ApiError> {
    let row = fetch_listing(state, id).await?;
    if row.seller_id != user.id {
        return Err(ApiError::forbidden("You can only update your own listings"));
    }
    Ok(row)
}

/// Validates an update payload into a DB patch.
pub(crate) async fn patch_from_request(
    state: &AppState,
    req: UpdateListingRequest,
) -> Result<ListingPatch, ApiError> {
    let required = |field: &str, value: Option<String>| -> Result<Option<String>, ApiError> {
        match value {
            Some(v) if v.trim().is_empty() => Err(ApiError::bad_request(format!("{field} cannot be empty"))),
            Some(v) => Ok(Some(v.trim().to_string())),
            None => Ok(None),
        }
    };

    let price = match req.price {
        Some(price) => Some(
            price
                .value()
                .ok_or_else(|| ApiError::bad_request("Price must be a positive number"))?,
        ),
        None => None,
    };
    let category_id = required("categoryId", req.category_id)?;
    if let Some(category_id) = &category_id {
        ensure_category(state, category_id).await?;
    }

    let patch = ListingPatch {
        title: required("title", req.title)?,
        description: required("description", req.description)?,
        price,
        images: req.images,
        condition: required("condition", req.condition)?,
        location: required("location", req.location)?,
        category_id,
        is_active: req.is_active,
        is_sold: req.is_sold,
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    Ok(patch)
}

pub(crate) async fn apply_patch(
    state: &AppState,
    id: Uuid,
    patch: ListingPatch,
) -> Result<ListingRow, ApiError> {
    db_call(state, move |db| {
        let id = id.to_string();
        if !db.update_listing(&id, &patch)? {
            return Ok(None);
        }
        db.get_listing(&id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Listing not found"))
}

pub(crate) async fn remove_listing(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    let deleted = db_call(state, move |db| db.delete_listing(&id.to_string())).await?;
    if !deleted {
        return Err(ApiError::not_found("Listing not found"));
    }
    Ok(())
}

async fn ensure_category(state: &AppState, category_id: &str) -> Result<(), ApiError> {
    let id = category_id.to_string();
    db_call(state, move |db| db.get_category(&id))
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::bad_request("Unknown category"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
