//! Integration tests for the account lifecycle.

use http::StatusCode;

use crate::helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_confirm_login_flow() {
    let app = TestApp::with_confirmation().await;
    let user_id = app.register("ada").await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth/login",
            Some(serde_json::json!({ "email": "ada@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let token = app.confirmation_token(user_id).await;
    let response = app
        .request(
            "GET",
            &format!("/api/v1/auth/confirm?token={token}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Account confirmed");

    let access = app.login("ada").await;
    assert!(!access.is_empty());
}

#[tokio::test]
async fn test_login_invalid_password() {
    let app = TestApp::new().await;
    app.register("grace").await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth/login",
            Some(serde_json::json!({
                "email": "grace@example.com",
                "password": "wrongpassword",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    // Errors carry only a message.
    assert!(response.body["message"].is_string());
    assert!(response.body.get("body").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("linus").await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth",
            Some(serde_json::json!({
                "full_name": "Someone Else",
                "email": "linus@example.com",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_refresh_and_logout() {
    let app = TestApp::new().await;
    app.register("ken").await;

    let response = app
        .request(
            "POST",
            "/api/v1/auth/login",
            Some(serde_json::json!({ "email": "ken@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    let refresh_token = response.body["body"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request(
            "POST",
            "/api/v1/auth/refresh",
            Some(serde_json::json!({ "refresh_token": refresh_token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let access = response.body["body"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request("POST", "/api/v1/auth/logout", None, Some(&access))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // The revoked token no longer authenticates.
    let response = app
        .request("POST", "/api/v1/auth/logout", None, Some(&access))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/v1/repository",
            Some(serde_json::json!({ "name": "anon" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            "POST",
            "/api/v1/repository",
            Some(serde_json::json!({ "name": "anon" })),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_user_and_health() {
    let app = TestApp::new().await;
    app.register("margaret").await;

    let response = app.request("GET", "/api/v1/user/margaret", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["body"]["username"], "margaret");

    let response = app.request("GET", "/api/v1/user/nobody", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.get_raw("/api/v1/healthz", None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}
