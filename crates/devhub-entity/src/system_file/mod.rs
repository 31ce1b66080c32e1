//! Virtual filesystem nodes.

pub mod model;

pub use model::{NewSystemFile, SystemFile, sort_listing};
