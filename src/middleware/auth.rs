use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{csrf_token_for, decode_session_token};
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::SESSION_COOKIE;

/// Authenticated session context extracted from the session cookie
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub sid: Uuid,
    pub user: String,
    pub csrf_token: String,
}

/// Validates the session cookie and injects [`SessionUser`] into the request
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie_value(request.headers(), SESSION_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let claims = decode_session_token(&token, &state.security.session_secret)?;

    // The cookie may outlive the server-side session (logout, expiry, restart)
    if state.store.get(&claims.sid).await.is_none() {
        return Err(ApiError::unauthorized("Not authenticated"));
    }

    let session_user = SessionUser {
        sid: claims.sid,
        csrf_token: csrf_token_for(&claims.sid, &state.security.session_secret),
        user: claims.user,
    };
    request.extensions_mut().insert(session_user);

    Ok(next.run(request).await)
}

/// Extract a cookie value from the Cookie header(s)
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; whodis_session=abc.def.ghi; csrf_token=123"),
        );
        assert_eq!(cookie_value(&headers, "whodis_session").as_deref(), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "csrf_token").as_deref(), Some("123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("whodis_session="));
        assert_eq!(cookie_value(&headers, "whodis_session"), None);
    }
}
