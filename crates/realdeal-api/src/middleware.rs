use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::AppState;
use crate::error::{ApiError, db_call};

/// The user resolved from the bearer email, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// The credential is the account email itself: `Authorization: Bearer <email>`.
pub fn bearer_email(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|email| !email.is_empty())
}

/// Resolve the bearer email to a user row; 401 when absent or unknown.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = bearer_email(req.headers()).ok_or(ApiError::Unauthorized)?.to_string();

    let user = db_call(&state, move |db| db.get_user_by_email(&email))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name,
    });
    Ok(next.run(req).await)
}

/// Admin gate: the bearer email must equal the configured admin address.
/// Anyone who knows that address passes; there is no secret involved.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let allowed = bearer_email(req.headers())
        .is_some_and(|email| email.eq_ignore_ascii_case(state.admin_email.trim()));

    if !allowed {
        warn!("Rejected admin request for {}", req.uri().path());
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_email_parsing() {
        assert_eq!(bearer_email(&headers("Bearer demo@example.com")), Some("demo@example.com"));
        assert_eq!(bearer_email(&headers("Bearer   ")), None);
        assert_eq!(bearer_email(&headers("Basic abc")), None);
        assert_eq!(bearer_email(&HeaderMap::new()), None);
    }
}
