use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use realdeal_types::api::{MarkReadResponse, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::chats::fetch_chat_for;
use crate::convert;
use crate::error::{ApiError, db_call};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::middleware::CurrentUser;

/// Upper bound on message length, in characters.
const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// RFC 3339 timestamp of the newest message the client already has.
    /// Clients poll with this every few seconds.
    pub after: Option<String>,
}

pub async fn get_messages(
    State(state): State<AppState>,
    PathParam(chat_id): PathParam<Uuid>,
    Extension(user): Extension<CurrentUser>,
    QueryParams(query): QueryParams<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let after = match query.after.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            convert::storage_timestamp(raw)
                .ok_or_else(|| ApiError::bad_request("Invalid 'after' timestamp"))?,
        ),
        _ => None,
    };

    let chat = fetch_chat_for(&state, chat_id, &user).await?;
    let rows = db_call(&state, move |db| db.get_messages(&chat.id, after.as_deref())).await?;
    let messages: Vec<MessageResponse> = rows.into_iter().map(convert::message).collect();
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    PathParam(chat_id): PathParam<Uuid>,
    Extension(user): Extension<CurrentUser>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("Message content is required"))?;
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ApiError::bad_request(format!(
            "Message content exceeds {MAX_CONTENT_CHARS} characters"
        )));
    }

    let chat = fetch_chat_for(&state, chat_id, &user).await?;
    let message_id = Uuid::new_v4().to_string();
    let sender_id = user.id.clone();
    let row = db_call(&state, move |db| {
        db.insert_message(&message_id, &chat.id, &sender_id, &content)
    })
    .await?;

    debug!("Message {} posted to chat {}", row.id, chat_id);
    Ok((StatusCode::CREATED, Json(convert::message(row))))
}

/// POST /api/chats/{id}/read: mark the other side's messages as read.
pub async fn mark_read(
    State(state): State<AppState>,
    PathParam(chat_id): PathParam<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let chat = fetch_chat_for(&state, chat_id, &user).await?;
    let reader = user.id.clone();
    let marked = db_call(&state, move |db| db.mark_messages_read(&chat.id, &reader)).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        messages_marked_as_read: marked,
    }))
}
