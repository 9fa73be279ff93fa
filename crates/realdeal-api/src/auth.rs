use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use realdeal_db::Database;
use realdeal_db::models::NewUser;
use realdeal_types::api::{AuthResponse, LoginRequest, RegisterRequest};

use crate::convert;
use crate::error::{ApiError, db_call};
use crate::extract::JsonBody;
use crate::middleware::CurrentUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// The one account allowed through the admin gate.
    pub admin_email: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

const MIN_PASSWORD_LEN: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    let name = req.name.trim().to_string();

    // Validate input
    if email.is_empty() || name.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Check if email is taken
    let lookup = email.clone();
    if db_call(&state, move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();
    let phone = req.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

    let id = user_id.clone();
    let row = db_call(&state, move |db| {
        db.create_user(&NewUser {
            id: &id,
            email: &email,
            name: &name,
            password_hash: &password_hash,
            phone: phone.as_deref(),
        })?;
        db.get_user_by_id(&id)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user {} missing after insert", user_id)))?;

    info!("Registered user {}", row.email);
    Ok((StatusCode::CREATED, Json(convert::user(&row))))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.trim().to_string();
    let user = db_call(&state, move |db| db.get_user_by_email(&email)).await?;

    let verified = match &user {
        Some(user) if !req.password.is_empty() => verify_password(&req.password, &user.password)?,
        _ => false,
    };

    match user {
        Some(user) if verified => Ok(Json(AuthResponse {
            user: convert::user(&user),
            authenticated: true,
        })
        .into_response()),
        _ => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials", "authenticated": false })),
        )
            .into_response()),
    }
}

pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = current.id.clone();
    let row = db_call(&state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(convert::user(&row)))
}

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("stored password hash unreadable: {}", e)))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
