//! Discussion posts.

pub mod model;

pub use model::{Discussion, NewDiscussion};
