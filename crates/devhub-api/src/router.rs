//! Route definitions for the DevHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api/v1`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;
    let max_body = server.max_body_bytes;
    let timeout = Duration::from_secs(server.request_timeout_seconds);
    let cors = middleware::cors::build_cors_layer(&server.cors);

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(repository_routes())
        .merge(discussion_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Registration, confirmation, login, refresh, logout
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", post(handlers::auth::register))
        .route("/auth/confirm", get(handlers::auth::confirm))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
}

/// Public profiles
fn user_routes() -> Router<AppState> {
    Router::new().route("/user/{username}", get(handlers::user::get_user))
}

/// Repository pages, mutations and the file tree.
///
/// Routes sharing a path shape share parameter names: `{owner}` is the
/// username on reads and the repository id on writes.
fn repository_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/repository",
            get(handlers::repository::get_repositories)
                .post(handlers::repository::upload_repository),
        )
        .route(
            "/repository/download/{id}",
            get(handlers::repository::download_repository),
        )
        .route(
            "/repository/like/{id}",
            post(handlers::repository::toggle_like),
        )
        .route("/repository/link/{id}", put(handlers::repository::add_link))
        .route(
            "/repository/element/{id}",
            put(handlers::element::create_element),
        )
        .route(
            "/repository/{owner}",
            get(handlers::repository::get_user_repositories)
                .put(handlers::repository::update_repository)
                .delete(handlers::repository::delete_repository),
        )
        .route(
            "/repository/{owner}/{name}",
            get(handlers::repository::get_repository).delete(handlers::element::delete_element),
        )
        .route(
            "/repository/{owner}/{name}/{folder}",
            get(handlers::repository::get_folder),
        )
        .route(
            "/repository/{owner}/link/{link}",
            delete(handlers::repository::delete_link),
        )
}

/// Discussions
fn discussion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/discussion",
            get(handlers::discussion::list).post(handlers::discussion::publish),
        )
        .route("/discussion/{code}", get(handlers::discussion::get))
}

/// Health check (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/healthz", get(handlers::health::healthz))
}
