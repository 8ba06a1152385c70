//! Integration tests for registration, login, logout and the current user
//!
//! Each test builds its own router over an empty memory store.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{TestContext, PASSWORD};
use serde_json::json;
use tower::Service as _;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
                "device_name": "iphone",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().unwrap().starts_with("todo_"));
    assert_eq!(body["user"]["name"], "Jane Doe");
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_token_works_immediately() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane Doe", "jane@example.com").await;

    let (status, body) = ctx.get("/user", Some(&user.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id.as_str());
    assert_eq!(body["email"], "jane@example.com");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new();
    ctx.register("Jane Doe", "jane@example.com").await;

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Other Jane",
                "email": "Jane@Example.com",
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "password": PASSWORD,
                "password_confirmation": "different123",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["password"][0],
        "The password field confirmation does not match."
    );

    let (status, body) = ctx.post("/auth/register", None, json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
    assert_eq!(body["errors"]["email"][0], "The email field is required.");
    assert_eq!(body["errors"]["password"][0], "The password field is required.");

    // Nothing was created, so the address is still free
    ctx.register("Jane Doe", "jane@example.com").await;
}

#[tokio::test]
async fn test_register_wrong_typed_email() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Jane Doe",
                "email": 5,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "The email field must be a string.");
}

#[tokio::test]
async fn test_register_rejects_non_json_body() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_issues_new_token() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane Doe", "jane@example.com").await;

    let (status, body) = ctx
        .post(
            "/auth/login",
            None,
            json!({ "email": "JANE@example.com", "password": PASSWORD, "device_name": "postman" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id.as_str());

    let token = body["token"].as_str().unwrap();
    assert_ne!(token, user.token);

    let (status, _) = ctx.get("/user", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("Jane Doe", "jane@example.com").await;

    let (wrong_status, wrong_body) = ctx
        .post(
            "/auth/login",
            None,
            json!({ "email": "jane@example.com", "password": "wrong-password" }),
        )
        .await;
    let (unknown_status, unknown_body) = ctx
        .post(
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(
        wrong_body["errors"]["email"][0],
        "These credentials do not match our records."
    );
    assert!(wrong_body.get("token").is_none());
}

#[tokio::test]
async fn test_login_missing_fields() {
    let ctx = TestContext::new();

    let (status, body) = ctx.post("/auth/login", None, json!({})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"][0], "The email field is required.");
    assert_eq!(body["errors"]["password"][0], "The password field is required.");
}

#[tokio::test]
async fn test_logout_revokes_only_presented_token() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com").await;
    let t1 = ctx.login(&user.email, Some("laptop")).await;
    let t2 = ctx.login(&user.email, Some("phone")).await;

    let (status, body) = ctx.post("/auth/logout", Some(&t1), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    let (status, _) = ctx.get("/todos", Some(&t1)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/todos", Some(&t2)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.get("/user", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_twice_is_unauthenticated() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com").await;

    let (status, _) = ctx.post("/auth/logout", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.post("/auth/logout", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthenticated.");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    for uri in ["/user", "/todos"] {
        let (status, body) = ctx.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthenticated");
    }

    let (status, _) = ctx.post("/auth/logout", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_and_unknown_tokens() {
    let ctx = TestContext::new();
    let user = ctx.register("Jane", "jane@example.com").await;

    // Well-formed but never issued
    let forged = format!("todo_{}", "A".repeat(48));
    let (status, _) = ctx.get("/user", Some(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/user", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let request = Request::builder()
        .uri("/user")
        .header(header::AUTHORIZATION, format!("Basic {}", user.token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Scheme is case-insensitive
    let request = Request::builder()
        .uri("/user")
        .header(header::AUTHORIZATION, format!("bearer {}", user.token))
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
