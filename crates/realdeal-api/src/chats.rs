use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use realdeal_db::models::ChatRow;
use realdeal_types::api::{ChatSummary, CreateChatRequest};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, db_call};
use crate::extract::{JsonBody, PathParam};
use crate::listings::fetch_listing;
use crate::middleware::CurrentUser;

/// GET /api/chats: every conversation the caller is part of.
pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = user.id.clone();
    let rows = db_call(&state, move |db| db.list_chats_for_user(&viewer)).await?;
    let chats: Vec<ChatSummary> = rows
        .into_iter()
        .map(|row| convert::chat_summary(row, &user.id))
        .collect();
    Ok(Json(chats))
}

/// POST /api/chats: open (or reopen) the caller's conversation about a listing.
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    JsonBody(req): JsonBody<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = req
        .listing_id
        .ok_or_else(|| ApiError::bad_request("Missing required field: listingId"))?;

    let listing = fetch_listing(&state, listing_id).await?;
    if let Some(seller_id) = req.seller_id {
        if seller_id.to_string() != listing.seller_id {
            return Err(ApiError::bad_request("sellerId does not own this listing"));
        }
    }
    if listing.seller_id == user.id {
        return Err(ApiError::bad_request("You cannot message your own listing"));
    }

    let chat_id = Uuid::new_v4().to_string();
    let buyer_id = user.id.clone();
    let (chat, created) = db_call(&state, move |db| {
        db.find_or_create_chat(&chat_id, &listing.id, &buyer_id, &listing.seller_id)
    })
    .await?;

    let status = if created {
        info!("Chat {} opened by {} on listing {}", chat.id, user.email, listing_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(convert::chat(chat))))
}

pub async fn get_chat(
    State(state): State<AppState>,
    PathParam(chat_id): PathParam<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let chat = fetch_chat_for(&state, chat_id, &user).await?;
    Ok(Json(convert::chat(chat)))
}

/// Loads a chat the caller participates in: 404 when missing, 403 otherwise.
pub(crate) async fn fetch_chat_for(
    state: &AppState,
    chat_id: Uuid,
    user: &CurrentUser,
) -> Result<ChatRow, ApiError> {
    let chat = db_call(state, move |db| db.get_chat(&chat_id.to_string()))
        .await?
        .ok_or_else(|| ApiError::not_found("Chat not found"))?;

    if !chat.has_participant(&user.id) {
        return Err(ApiError::forbidden("You do not have access to this conversation"));
    }
    Ok(chat)
}
