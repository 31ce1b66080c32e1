//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use devhub_api::{AppState, build_router};
use devhub_cache::CacheManager;
use devhub_core::config::AppConfig;
use devhub_core::traits::StorageProvider;
use devhub_database::Stores;
use devhub_entity::user::TokenPurpose;
use devhub_storage::LocalStorageProvider;

/// A password strong enough for the default zxcvbn threshold.
pub const PASSWORD: &str = "orbit-Maple-quartz-71";

const BOUNDARY: &str = "devhub-test-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for direct store access
    pub state: AppState,
    /// Keeps the object store directory alive
    _storage_dir: TempDir,
}

impl TestApp {
    /// A test application with account confirmation disabled.
    pub async fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.require_confirmation = false;
        Self::with_config(config).await
    }

    /// A test application that requires accounts to be confirmed.
    pub async fn with_confirmation() -> Self {
        let mut config = AppConfig::default();
        config.auth.require_confirmation = true;
        Self::with_config(config).await
    }

    async fn with_config(mut config: AppConfig) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.storage.root_path = dir.path().to_string_lossy().into_owned();
        config.worker.enabled = false;

        let cache = Arc::new(
            CacheManager::new(&config.cache)
                .await
                .expect("Failed to init cache"),
        );
        let storage: Arc<dyn StorageProvider> = Arc::new(
            LocalStorageProvider::new(&config.storage.root_path)
                .await
                .expect("Failed to init storage"),
        );

        let state = AppState::build(config, Stores::memory(), cache, storage);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _storage_dir: dir,
        }
    }

    /// Registers `username` and returns its id.
    pub async fn register(&self, username: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/v1/auth",
                Some(serde_json::json!({
                    "full_name": username,
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        let id = response.body["body"]["id"]
            .as_str()
            .expect("Missing user id");
        Uuid::parse_str(id).expect("Invalid user id")
    }

    /// Logs in and returns an access token.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .request(
                "POST",
                "/api/v1/auth/login",
                Some(serde_json::json!({
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

        response.body["body"]["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }

    /// Registers and logs in `username`.
    pub async fn signed_in(&self, username: &str) -> (Uuid, String) {
        let id = self.register(username).await;
        let token = self.login(username).await;
        (id, token)
    }

    /// The confirmation token most recently issued to `user_id`.
    pub async fn confirmation_token(&self, user_id: Uuid) -> String {
        self.state
            .stores
            .tokens
            .find_by_user(user_id, TokenPurpose::ConfirmAccount)
            .await
            .expect("Token lookup failed")
            .first()
            .expect("No confirmation token issued")
            .token
            .clone()
    }

    /// Creates a repository through the API and returns its id.
    pub async fn create_repository(&self, token: &str, name: &str, access: &str) -> Uuid {
        let response = self
            .request(
                "POST",
                "/api/v1/repository",
                Some(serde_json::json!({
                    "name": name,
                    "description": "test repository",
                    "access": access,
                })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        Uuid::parse_str(response.body["body"]["id"].as_str().expect("Missing id"))
            .expect("Invalid repository id")
    }

    /// Uploads a directory element and returns its id.
    pub async fn create_folder(
        &self,
        token: &str,
        repository: Uuid,
        parent: Option<Uuid>,
        name: &str,
    ) -> Uuid {
        let response = self
            .multipart(
                "PUT",
                &element_path(repository, parent),
                &[("name", name), ("is_directory", "true")],
                None,
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        element_id(&response)
    }

    /// Uploads a file element and returns its id.
    pub async fn create_file(
        &self,
        token: &str,
        repository: Uuid,
        parent: Option<Uuid>,
        file_name: &str,
        contents: &[u8],
    ) -> Uuid {
        let response = self
            .multipart(
                "PUT",
                &element_path(repository, parent),
                &[("is_directory", "false")],
                Some(("file", file_name, contents)),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        element_id(&response)
    }

    /// Sends a JSON request and parses the JSON response.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await.into()
    }

    /// Sends a multipart request with text fields and an optional
    /// `(field, file name, contents)` file part.
    pub async fn multipart(
        &self,
        method: &str,
        path: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, contents)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(contents);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req.body(Body::from(body)).expect("Failed to build request");
        self.send(req).await.into()
    }

    /// Sends a GET and returns the raw response.
    pub async fn get_raw(&self, path: &str, token: Option<&str>) -> RawResponse {
        let mut req = Request::builder().method("GET").uri(path);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        let req = req.body(Body::empty()).expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> RawResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        RawResponse {
            status,
            headers,
            body,
        }
    }
}

fn element_path(repository: Uuid, parent: Option<Uuid>) -> String {
    match parent {
        Some(parent) => format!("/api/v1/repository/element/{repository}?parent={parent}"),
        None => format!("/api/v1/repository/element/{repository}"),
    }
}

fn element_id(response: &TestResponse) -> Uuid {
    Uuid::parse_str(response.body["body"]["id"].as_str().expect("Missing element id"))
        .expect("Invalid element id")
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Unparsed response, for downloads
#[derive(Debug)]
pub struct RawResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response bytes
    pub body: Bytes,
}

impl From<RawResponse> for TestResponse {
    fn from(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            body: serde_json::from_slice(&raw.body).unwrap_or(Value::Null),
        }
    }
}
