//! User domain entities.

pub mod model;
pub mod role;
pub mod token;

pub use model::{NewUser, User, UserSummary};
pub use role::UserRole;
pub use token::{NewUserToken, TokenPurpose, UserToken};
