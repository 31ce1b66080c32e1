//! # devhub-entity
//!
//! Domain entity models for DevHub. Every struct in this crate represents
//! a stored document or a domain value object. All entities derive `Debug`,
//! `Clone`, `Serialize`, `Deserialize`, and stored entities additionally
//! derive `sqlx::FromRow`.
//!
//! Input structs (`New*`) carry `validator` rules that mirror the store's
//! constraints, so invalid data is rejected before it reaches a backend.

pub mod discussion;
pub mod like;
pub mod repository;
pub mod system_file;
pub mod user;
pub mod validation;
