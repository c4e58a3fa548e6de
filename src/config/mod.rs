use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::monitor::SessionTimeoutConfig;

/// Upper bound for the session cookie lifetime (one year)
pub const MAX_SESSION_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub session: SessionTimeoutConfig,
    pub security: SecurityConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub sweep_interval_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_secret: String,
    pub session_max_hours: u64,
    pub secure_cookies: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub request_timeout_secs: u64,
    pub csrf_cookie: String,
    pub login_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("WHODIS_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_SWEEP_INTERVAL_SECS") {
            self.server.sweep_interval_secs = v.parse().unwrap_or(self.server.sweep_interval_secs);
        }
        if let Ok(v) = env::var("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Session timeout overrides; an invalid combination falls back to the preset
        let mut session = self.session;
        if let Ok(v) = env::var("SESSION_TIMEOUT_MINUTES") {
            session.timeout_minutes = v.parse().unwrap_or(session.timeout_minutes);
        }
        if let Ok(v) = env::var("SESSION_WARNING_MINUTES") {
            session.warning_minutes = v.parse().unwrap_or(session.warning_minutes);
        }
        if let Ok(v) = env::var("SESSION_CHECK_INTERVAL_SECONDS") {
            session.check_interval_seconds = v.parse().unwrap_or(session.check_interval_seconds);
        }
        match session.validate() {
            Ok(()) => self.session = session,
            Err(e) => tracing::warn!("Ignoring SESSION_* overrides: {}", e),
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_MAX_HOURS") {
            self.security.session_max_hours = parse_session_hours(&v, self.security.session_max_hours);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Client overrides
        if let Ok(v) = env::var("CLIENT_REQUEST_TIMEOUT_SECS") {
            self.client.request_timeout_secs = v.parse().unwrap_or(self.client.request_timeout_secs);
        }
        if let Ok(v) = env::var("CLIENT_CSRF_COOKIE") {
            self.client.csrf_cookie = v;
        }
        if let Ok(v) = env::var("CLIENT_LOGIN_PATH") {
            self.client.login_path = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                sweep_interval_secs: 60,
                enable_request_logging: true,
            },
            session: SessionTimeoutConfig::default(),
            security: SecurityConfig {
                session_secret: "whodis-development-secret".to_string(),
                session_max_hours: 24,
                secure_cookies: false,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5000".to_string()],
            },
            client: ClientConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                sweep_interval_secs: 60,
                enable_request_logging: true,
            },
            session: SessionTimeoutConfig::default(),
            security: SecurityConfig {
                session_secret: String::new(),
                session_max_hours: 12,
                secure_cookies: true,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            client: ClientConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                sweep_interval_secs: 60,
                enable_request_logging: false,
            },
            session: SessionTimeoutConfig::default(),
            security: SecurityConfig {
                session_secret: String::new(),
                session_max_hours: 8,
                secure_cookies: true,
                enable_cors: false,
                cors_origins: Vec::new(),
            },
            client: ClientConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            csrf_cookie: crate::types::CSRF_COOKIE.to_string(),
            login_path: "/login".to_string(),
        }
    }
}

/// Parses a session lifetime in hours, keeping `fallback` on bad input and
/// clamping to [`MAX_SESSION_HOURS`]
pub fn parse_session_hours(raw: &str, fallback: u64) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(fallback).min(MAX_SESSION_HOURS)
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
