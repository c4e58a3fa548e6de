mod common;

use anyhow::Result;
use common::{browser, login, post_with_csrf, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};
use whodis_session::types::CSRF_HEADER;

#[tokio::test]
async fn login_sets_session_and_csrf_cookies() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "alice" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookies: Vec<String> = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("whodis_session=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("csrf_token=") && !c.contains("HttpOnly")));

    let body: Value = resp.json().await?;
    assert_eq!(body["username"], "alice");
    assert!(body["csrf_token"].as_str().is_some_and(|t| t.len() == 64));
    assert_eq!(server.state.store.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn login_rejects_blank_username() -> Result<()> {
    let server = TestServer::spawn().await?;
    let resp = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "   " }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn session_api_requires_login() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();

    let resp = client.get(server.url("/api/session/config")).send().await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], true);

    let resp = client
        .post(server.url("/api/session/check"))
        .json(&json!({ "last_activity": 0 }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn config_is_readable_after_login() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();
    login(&server, &client, "alice").await?;

    let resp = client.get(server.url("/api/session/config")).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["timeout_minutes"], 15);
    assert_eq!(body["warning_minutes"], 2);
    assert_eq!(body["check_interval_seconds"], 30);
    Ok(())
}

#[tokio::test]
async fn check_requires_csrf_header() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();
    login(&server, &client, "alice").await?;

    let resp = client
        .post(server.url("/api/session/check"))
        .json(&json!({ "last_activity": chrono::Utc::now().timestamp() }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .post(server.url("/api/session/check"))
        .header(CSRF_HEADER, "not-the-token")
        .json(&json!({ "last_activity": chrono::Utc::now().timestamp() }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn check_and_extend_report_remaining_time() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();
    let csrf = login(&server, &client, "alice").await?;

    let now = chrono::Utc::now().timestamp();
    let resp = post_with_csrf(&server, &client, "/api/session/check", &csrf, json!({ "last_activity": now })).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["valid"], true);
    let remaining = body["remaining_seconds"].as_i64().unwrap_or_default();
    assert!((890..=900).contains(&remaining), "remaining was {}", remaining);
    assert_eq!(body["timeout_minutes"], 15);

    let resp = post_with_csrf(&server, &client, "/api/session/extend", &csrf, json!({})).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn logout_ends_the_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();
    let csrf = login(&server, &client, "alice").await?;

    let resp = post_with_csrf(&server, &client, "/api/session/logout", &csrf, json!({})).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(server.state.store.is_empty().await);

    let resp = post_with_csrf(
        &server,
        &client,
        "/api/session/check",
        &csrf,
        json!({ "last_activity": chrono::Utc::now().timestamp() }),
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn config_update_is_validated_and_applied() -> Result<()> {
    let server = TestServer::spawn().await?;
    let client = browser();
    let csrf = login(&server, &client, "admin").await?;

    let put = |body: Value| {
        client
            .put(server.url("/api/session/config"))
            .header(CSRF_HEADER, csrf.clone())
            .json(&body)
            .send()
    };

    let resp = put(json!({})).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put(json!({ "warning_minutes": 20 })).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put(json!({ "timeout_minutes": 80_000_000, "warning_minutes": 79_999_999 })).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put(json!({ "timeout_minutes": 30, "check_interval_seconds": 10 })).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["timeout_minutes"], 30);
    assert_eq!(body["warning_minutes"], 2);
    assert_eq!(body["check_interval_seconds"], 10);

    // Running clients see the change in their next check
    let resp = post_with_csrf(
        &server,
        &client,
        "/api/session/check",
        &csrf,
        json!({ "last_activity": chrono::Utc::now().timestamp() }),
    )
    .await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["timeout_minutes"], 30);
    assert_eq!(body["check_interval_seconds"], 10);
    Ok(())
}

#[tokio::test]
async fn forged_session_cookie_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let resp = reqwest::Client::new()
        .get(server.url("/api/session/config"))
        .header(reqwest::header::COOKIE, "whodis_session=not.a.jwt")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
