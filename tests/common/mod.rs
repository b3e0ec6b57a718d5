#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, header},
};
use bloglist::{AppConfig, AppState, MemoryRepository, create_router};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

/// Config for tests: in-memory storage and the cheapest Argon2 time cost.
pub fn test_config() -> AppConfig {
    AppConfig {
        hash_cost: 1,
        ..AppConfig::default()
    }
}

pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryRepository::new()), test_config())
        .expect("test config is valid")
}

pub fn test_app() -> Router {
    create_router(test_state())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Sends one request through the router in-process.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };

    TestResponse {
        status,
        content_type,
        body,
    }
}

pub async fn register(app: &Router, username: &str, password: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/users",
        None,
        Some(serde_json::json!({
            "username": username,
            "name": format!("{} Name", username),
            "password": password,
        })),
    )
    .await
}

/// Registers `username` and returns a token for it.
pub async fn register_and_login(app: &Router, username: &str) -> String {
    let res = register(app, username, "sekret").await;
    assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);

    let res = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({ "username": username, "password": "sekret" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
    res.body["token"].as_str().unwrap().to_string()
}

pub async fn create_blog(app: &Router, token: &str, title: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/blogs",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "author": "Michael Chan",
            "url": "https://reactpatterns.com/",
            "likes": 7,
        })),
    )
    .await
}

pub async fn blog_count(app: &Router) -> usize {
    let res = send(app, Method::GET, "/blogs", None, None).await;
    res.body.as_array().unwrap().len()
}
