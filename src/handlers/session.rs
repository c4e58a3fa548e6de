use axum::{
    extract::{Extension, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::SessionUser;
use crate::monitor::{ConfigUpdate, SessionTimeoutConfig};
use crate::server::AppState;
use crate::types::{CheckRequest, CheckResponse, ExtendResponse, CSRF_COOKIE, SESSION_COOKIE};

/// GET /api/session/config - Current inactivity timeout settings
///
/// ```json
/// { "timeout_minutes": 15, "warning_minutes": 2, "check_interval_seconds": 30 }
/// ```
pub async fn get_config(State(state): State<AppState>) -> Json<SessionTimeoutConfig> {
    Json(state.store.config().await)
}

/// PUT /api/session/config - Edit timeout settings from the admin console
///
/// Accepts any subset of the three fields. Running monitors pick the new
/// values up from their next check response.
pub async fn update_config(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<SessionTimeoutConfig>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::bad_request("No configuration fields provided"));
    }

    let config = state.store.update_config(&update).await?;
    tracing::info!("Session timeout config changed by '{}': {:?}", session_user.user, config);
    Ok(Json(config))
}

/// POST /api/session/check - Report activity and confirm the session is alive
///
/// Input: `{ "last_activity": <unix seconds> }`. The backend is authoritative:
/// a session idle for the full timeout answers 401. Success echoes the current
/// config so clients follow edits without reloading.
pub async fn check(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let remaining = state
        .store
        .touch(&session_user.sid, payload.last_activity, Utc::now())
        .await?;
    let config = state.store.config().await;

    Ok(Json(CheckResponse {
        valid: true,
        remaining_seconds: Some(remaining),
        config: config.into(),
    }))
}

/// POST /api/session/extend - "Continue Session"
pub async fn extend(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
) -> Result<Json<ExtendResponse>, ApiError> {
    let remaining = state.store.extend(&session_user.sid, Utc::now()).await?;
    tracing::info!("Session extended for '{}'", session_user.user);

    Ok(Json(ExtendResponse {
        success: true,
        remaining_seconds: Some(remaining),
    }))
}

/// POST /api/session/logout - End the session and clear its cookies
pub async fn logout(
    State(state): State<AppState>,
    Extension(session_user): Extension<SessionUser>,
) -> impl IntoResponse {
    state.store.remove(&session_user.sid).await;

    let cookies = AppendHeaders([
        (SET_COOKIE, state.expired_cookie(SESSION_COOKIE)),
        (SET_COOKIE, state.expired_cookie(CSRF_COOKIE)),
    ]);
    (cookies, Json(json!({ "success": true })))
}
