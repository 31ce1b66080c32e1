//! # devhub-api
//!
//! HTTP API layer for DevHub built on Axum.
//!
//! Provides the REST endpoints under `/api/v1`, the middleware stack
//! (request logging, tracing, CORS, compression, timeouts, body limits),
//! the bearer-token extractors, the response envelope, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::run_server;
pub use router::build_router;
pub use state::AppState;
