//! Built-in maintenance jobs.

pub mod sweep;
pub mod tokens;

pub use sweep::OrphanSweepHandler;
pub use tokens::TokenCleanupHandler;
