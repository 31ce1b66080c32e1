//! # devhub-service
//!
//! Business logic service layer for DevHub. Each service composes the
//! document stores, the cache, and the object store to implement one
//! group of use cases.
//!
//! Services follow constructor injection: every dependency is handed in
//! at construction time as an `Arc<dyn …>` or a cloneable service, so the
//! tests run the same code over in-memory doubles.

pub mod access;
pub mod archive;
pub mod auth;
pub mod context;
pub mod discussion;
pub mod repository;
pub mod tree;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessResolver;
pub use archive::{Archive, ArchiveBuilder};
pub use auth::{AuthService, LoginResponse, RefreshResponse, RegisterRequest};
pub use context::RequestContext;
pub use discussion::{DiscussionService, PublishedDiscussion};
pub use repository::{RepositoryDetail, RepositoryService};
pub use tree::{NodeForm, TreeEngine, UploadedFile};
pub use user::UserService;
