use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::task::JoinHandle;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig, ServerConfig};
use crate::handlers;
use crate::middleware::{csrf_middleware, session_auth_middleware};
use crate::monitor::SessionTimeoutConfig;
use crate::services::SessionStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    pub fn new(session: SessionTimeoutConfig, security: SecurityConfig) -> Self {
        Self {
            store: Arc::new(SessionStore::new(session)),
            security: Arc::new(security),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.session, config.security.clone())
    }

    /// `Set-Cookie` value for a session-scoped cookie
    pub fn session_cookie(&self, name: &str, value: &str, http_only: bool) -> String {
        let mut cookie = format!("{}={}; Path=/; SameSite=Lax", name, value);
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.security.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that deletes `name`
    pub fn expired_cookie(&self, name: &str) -> String {
        format!("{}=; Path=/; Max-Age=0; SameSite=Lax", name)
    }
}

pub fn app(state: AppState) -> Router {
    let session_routes = Router::new()
        .route(
            "/api/session/config",
            get(handlers::session::get_config).put(handlers::session::update_config),
        )
        .route("/api/session/check", post(handlers::session::check))
        .route("/api/session/extend", post(handlers::session::extend))
        .route("/api/session/logout", post(handlers::session::logout))
        // Layers run bottom-up: authenticate first, then check CSRF
        .route_layer(axum::middleware::from_fn(csrf_middleware))
        .route_layer(from_fn_with_state(state.clone(), session_auth_middleware));

    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::auth::login))
        // Session API
        .merge(session_routes)
        .fallback(handlers::not_found)
        // Global middleware
        .layer(cors_layer(&state.security))
        .with_state(state)
}

/// Wraps the router with request tracing when the server config asks for it
pub fn with_request_logging(router: Router, server: &ServerConfig) -> Router {
    if server.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors || security.cors_origins.is_empty() {
        return CorsLayer::new();
    }

    let origins = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok());

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-csrf-token")])
}

/// Periodically drops sessions that timed out without a final check
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let purged = store.purge_expired(chrono::Utc::now()).await;
            if purged > 0 {
                tracing::info!("Purged {} expired session(s)", purged);
            }
        }
    })
}
