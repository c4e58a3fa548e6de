use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::SessionUser;
use crate::auth::tokens_match;
use crate::error::ApiError;
use crate::types::CSRF_HEADER;

/// Requires a matching `X-CSRF-Token` header on state-changing requests.
/// Must run after [`super::session_auth_middleware`].
pub async fn csrf_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.method().is_safe() {
        return Ok(next.run(request).await);
    }

    let session_user = request
        .extensions()
        .get::<SessionUser>()
        .ok_or_else(|| ApiError::internal_server_error("Session authentication required before CSRF validation"))?;

    let provided = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !tokens_match(&session_user.csrf_token, provided) {
        tracing::warn!(
            "CSRF validation failed for '{}' on {} {}",
            session_user.user,
            request.method(),
            request.uri().path()
        );
        return Err(ApiError::forbidden("CSRF token missing or invalid"));
    }

    Ok(next.run(request).await)
}
