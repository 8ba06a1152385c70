//! Common test utilities for integration tests
//!
//! Builds the full router over a fresh `MemoryStore` per test and drives it
//! in-process through `tower::Service`, no sockets involved.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use todo_api::app::{build_router, AppState};
use todo_api::config::Config;
use todo_shared::store::MemoryStore;
use tower::Service as _;

pub const PASSWORD: &str = "password123";

/// Test context containing the router and its store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
}

/// A registered user and the token from registration
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), Config::for_memory_store()));

        Self { store, app }
    }

    /// Sends one request and returns the status and JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "{} returned non-JSON body: {}",
                    status,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers a user and returns it with its first token
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({
                    "name": name,
                    "email": email,
                    "password": PASSWORD,
                    "password_confirmation": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Logs in and returns the new token
    pub async fn login(&self, email: &str, device_name: Option<&str>) -> String {
        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD, "device_name": device_name }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a todo and returns its id
    pub async fn create_todo(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .post("/todos", Some(token), json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

        body["data"]["id"].as_str().unwrap().to_string()
    }
}
