//! Route handlers organized by domain.

pub mod auth;
pub mod discussion;
pub mod element;
pub mod health;
pub mod repository;
pub mod user;

use uuid::Uuid;

use devhub_core::error::AppError;

/// Parses a UUID from a path segment or form field.
pub fn parse_id(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s.trim()).map_err(|_| AppError::bad_request(format!("Invalid identifier: {s}")))
}
