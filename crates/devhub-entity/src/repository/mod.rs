//! Repository domain entities.

pub mod access;
pub mod link;
pub mod model;

pub use access::{Access, RepositoryAccess};
pub use link::{Link, LinkKind, NewLink};
pub use model::{NewRepository, Repository, RepositoryPatch, RepositoryUpdate};
