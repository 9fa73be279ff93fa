use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_auth};
use crate::uploads::{MAX_FILES_PER_REQUEST, PUBLIC_PREFIX};
use crate::{admin, categories, chats, demo, listings, messages, uploads};

/// Slack on top of the file bytes for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/listings", get(listings::list_listings))
        .route("/api/listings/{id}", get(listings::get_listing))
        .route("/api/categories", get(categories::list_categories))
        .route("/api/dummy-data", get(demo::dummy_data));

    let upload_limit = state.max_upload_bytes * MAX_FILES_PER_REQUEST + MULTIPART_OVERHEAD;
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/listings", post(listings::create_listing))
        .route(
            "/api/listings/{id}",
            patch(listings::update_listing).delete(listings::delete_listing),
        )
        .route("/api/listings/{id}/status", patch(listings::update_status))
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route("/api/chats/{id}", get(chats::get_chat))
        .route(
            "/api/chats/{id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/api/chats/{id}/read", post(messages::mark_read))
        .route(
            "/api/upload",
            post(uploads::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route(
            "/api/admin/listings",
            get(admin::list_listings)
                .put(admin::update_listing)
                .delete(admin::delete_listing),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let upload_dir = state.upload_dir.clone();

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .route("/health", get(health))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_dir))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
