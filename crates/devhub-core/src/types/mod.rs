//! Core type definitions used across the DevHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
