//! # devhub-database
//!
//! The document store. [`store`] defines one trait per collection; the
//! [`postgres`] module implements them over a sqlx pool and [`memory`]
//! implements them in-process for development and tests. [`Stores`]
//! bundles one implementation of every trait, chosen by configuration.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;
pub mod stores;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    DiscussionQuery, DiscussionStore, LikeStore, NodeStore, RepositoryQuery, RepositoryStore,
    TokenStore, UserStore,
};
pub use stores::Stores;
