//! Cache key builders for all DevHub cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. The Redis provider adds its
//! own configured prefix on top.

use uuid::Uuid;

/// View-throttle marker for one viewer of one repository.
///
/// Anonymous viewers share the `anon` slot.
pub fn repository_view(repository_id: Uuid, viewer: Option<Uuid>) -> String {
    match viewer {
        Some(user_id) => format!("repository:view:{repository_id}:{user_id}"),
        None => format!("repository:view:{repository_id}:anon"),
    }
}

/// Cache key for the JWT blocklist (revoked tokens).
pub fn jwt_blocklist(jti: &str) -> String {
    format!("jwt:blocked:{jti}")
}
