//! # devhub-auth
//!
//! Authentication building blocks for DevHub.
//!
//! ## Modules
//!
//! - `jwt`: access/refresh token creation, validation, and blocklist management
//! - `password`: Argon2id password hashing and strength checks
//! - `token`: random one-time tokens and public handles

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair};
pub use password::{PasswordHasher, PasswordValidator};
