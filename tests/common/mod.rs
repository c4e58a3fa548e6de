#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use whodis_session::config::SecurityConfig;
use whodis_session::monitor::SessionTimeoutConfig;
use whodis_session::server::{app, AppState};
use whodis_session::types::CSRF_HEADER;

pub const TEST_SECRET: &str = "integration-test-secret";

/// An in-process session service bound to its own port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::with_config(SessionTimeoutConfig::default()).await
    }

    pub async fn with_config(session: SessionTimeoutConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let security = SecurityConfig {
            session_secret: TEST_SECRET.to_string(),
            session_max_hours: 1,
            secure_cookies: false,
            enable_cors: false,
            cors_origins: Vec::new(),
        };
        let state = AppState::new(session, security);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { port, base_url, state };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// A browser-like client: keeps cookies between requests
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("failed to build reqwest client")
}

/// Logs `username` in and returns the CSRF token from the response body
pub async fn login(server: &TestServer, client: &reqwest::Client, username: &str) -> Result<String> {
    let resp = client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": username }))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == StatusCode::OK, "login returned {}", resp.status());
    let body: Value = resp.json().await?;
    body["csrf_token"]
        .as_str()
        .map(str::to_string)
        .context("login response missing csrf_token")
}

/// POST with the CSRF header set
pub async fn post_with_csrf(
    server: &TestServer,
    client: &reqwest::Client,
    path: &str,
    csrf: &str,
    body: Value,
) -> Result<reqwest::Response> {
    Ok(client
        .post(server.url(path))
        .header(CSRF_HEADER, csrf)
        .json(&body)
        .send()
        .await?)
}
