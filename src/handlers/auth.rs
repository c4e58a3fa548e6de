use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;

use crate::auth::{csrf_token_for, issue_session_token, Claims};
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{LoginRequest, LoginResponse, CSRF_COOKIE, SESSION_COOKIE};

/// POST /auth/login - Development login issuing a session
///
/// Stands in for the directory-backed login of the console: any non-empty
/// username gets a session. Sets two cookies:
/// - `whodis_session`: HttpOnly signed session token
/// - `csrf_token`: readable anti-forgery token to echo in `X-CSRF-Token`
///
/// Expected Output:
/// ```json
/// { "username": "alice", "csrf_token": "9f86d0..." }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::bad_request("username is required"));
    }

    let now = Utc::now();
    let sid = state.store.create(username, now).await;
    let claims = Claims::new(sid, username.to_string(), now, state.security.session_max_hours);
    let token = match issue_session_token(&claims, &state.security.session_secret) {
        Ok(token) => token,
        Err(e) => {
            state.store.remove(&sid).await;
            return Err(e.into());
        }
    };
    let csrf_token = csrf_token_for(&sid, &state.security.session_secret);

    let cookies = AppendHeaders([
        (SET_COOKIE, state.session_cookie(SESSION_COOKIE, &token, true)),
        (SET_COOKIE, state.session_cookie(CSRF_COOKIE, &csrf_token, false)),
    ]);

    Ok((
        cookies,
        Json(LoginResponse {
            username: username.to_string(),
            csrf_token,
        }),
    ))
}
