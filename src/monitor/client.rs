use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use url::Url;

use super::config::{ConfigUpdate, SessionTimeoutConfig};
use super::error::{MonitorError, MonitorResult};
use crate::types::{CheckRequest, CheckResponse, LoginRequest, LoginResponse, CSRF_HEADER};

/// The session backend as seen by the monitor
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// GET /api/session/config
    async fn fetch_config(&self) -> MonitorResult<SessionTimeoutConfig>;

    /// POST /api/session/check with the last activity in unix seconds
    async fn check(&self, last_activity: i64) -> MonitorResult<CheckResponse>;

    /// POST /api/session/extend
    async fn extend(&self) -> MonitorResult<()>;

    /// POST /api/session/logout
    async fn logout(&self) -> MonitorResult<()>;
}

/// reqwest-backed [`SessionApi`] holding the session cookies in its own jar
#[derive(Clone)]
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    csrf_cookie: String,
}

impl HttpSessionApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        csrf_cookie: impl Into<String>,
    ) -> MonitorResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
            csrf_cookie: csrf_cookie.into(),
        })
    }

    /// Builds a client using the process-wide client settings
    pub fn from_config(base_url: &str) -> MonitorResult<Self> {
        let client_config = &crate::config::config().client;
        Self::new(
            base_url,
            Duration::from_secs(client_config.request_timeout_secs),
            client_config.csrf_cookie.clone(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> MonitorResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Reads the anti-forgery token from the cookie jar
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').map(str::trim).find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == self.csrf_cookie).then(|| value.to_string())
        })
    }

    fn with_csrf(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.csrf_token() {
            Some(token) => builder.header(CSRF_HEADER, token),
            None => {
                tracing::debug!("No {} cookie present, sending request without CSRF token", self.csrf_cookie);
                builder
            }
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> MonitorResult<Response> {
        let mut builder = self.with_csrf(self.client.post(self.endpoint(path)?));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        check_status(builder.send().await?)
    }

    /// POST /auth/login; stores the session and CSRF cookies in the jar
    pub async fn login(&self, username: &str) -> MonitorResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
        };
        let response = self
            .client
            .post(self.endpoint("/auth/login")?)
            .json(&request)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    /// PUT /api/session/config
    pub async fn update_config(&self, update: &ConfigUpdate) -> MonitorResult<SessionTimeoutConfig> {
        let builder = self.with_csrf(self.client.put(self.endpoint("/api/session/config")?));
        let response = check_status(builder.json(update).send().await?)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn fetch_config(&self) -> MonitorResult<SessionTimeoutConfig> {
        let response = self
            .client
            .get(self.endpoint("/api/session/config")?)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn check(&self, last_activity: i64) -> MonitorResult<CheckResponse> {
        let response = self
            .post("/api/session/check", Some(&CheckRequest { last_activity }))
            .await?;
        Ok(response.json().await?)
    }

    async fn extend(&self) -> MonitorResult<()> {
        self.post::<()>("/api/session/extend", None).await?;
        Ok(())
    }

    async fn logout(&self) -> MonitorResult<()> {
        self.post::<()>("/api/session/logout", None).await?;
        Ok(())
    }
}

fn check_status(response: Response) -> MonitorResult<Response> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(MonitorError::Unauthorized),
        status if !status.is_success() => Err(MonitorError::Status(status.as_u16())),
        _ => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = HttpSessionApi::new("http://127.0.0.1:3000/console", Duration::from_secs(5), "csrf_token").unwrap();
        assert_eq!(api.base_url().as_str(), "http://127.0.0.1:3000/console/");
        assert_eq!(
            api.endpoint("/api/session/check").unwrap().as_str(),
            "http://127.0.0.1:3000/console/api/session/check"
        );
    }

    #[test]
    fn test_csrf_token_read_from_jar() {
        let api = HttpSessionApi::new("http://localhost:3000", Duration::from_secs(5), "csrf_token").unwrap();
        assert_eq!(api.csrf_token(), None);

        let url = Url::parse("http://localhost:3000/").unwrap();
        api.jar.add_cookie_str("whodis_session=abc; Path=/", &url);
        api.jar.add_cookie_str("csrf_token=deadbeef; Path=/", &url);
        assert_eq!(api.csrf_token().as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpSessionApi::new("not a url", Duration::from_secs(5), "csrf_token");
        assert!(matches!(result, Err(MonitorError::InvalidUrl(_))));
    }
}
