//! # devhub-storage
//!
//! Object store for uploaded blobs. Blobs live in one flat namespace of
//! opaque names (`<uuid>.<ext>`); the tree structure lives in the document
//! store only.

pub mod naming;
pub mod providers;

pub use naming::{blob_name, mime_from_path};
#[cfg(feature = "local")]
pub use providers::local::LocalStorageProvider;
