//! # devhub-core
//!
//! Core crate for DevHub. Contains the unified error system, configuration
//! schemas, pagination types, the cache and object-store
//! provider traits, and the bounded fan-out utility shared by the services.
//!
//! This crate has **no** internal dependencies on other DevHub crates.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
