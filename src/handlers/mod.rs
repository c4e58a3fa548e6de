// handlers/mod.rs - two tiers
//
// Public (no session): /, /health, /auth/login
// Session (cookie + CSRF): /api/session/*
pub mod auth;
pub mod session;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::server::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Who Dis? session service",
            "version": version,
            "endpoints": {
                "login": "POST /auth/login (public)",
                "config": "GET|PUT /api/session/config (session)",
                "check": "POST /api/session/check (session, CSRF)",
                "extend": "POST /api/session/extend (session, CSRF)",
                "logout": "POST /api/session/logout (session, CSRF)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": chrono::Utc::now(),
                "sessions": state.store.len().await,
            }
        })),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
