//! PostgreSQL implementations of the store traits.

pub mod discussion;
pub mod like;
pub mod node;
pub mod repository;
pub mod token;
pub mod user;

pub use discussion::PgDiscussionStore;
pub use like::PgLikeStore;
pub use node::PgNodeStore;
pub use repository::PgRepositoryStore;
pub use token::PgTokenStore;
pub use user::PgUserStore;

/// Build an `ILIKE` pattern matching `term` as a literal substring.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Whether `err` is a unique violation on `constraint`.
pub(crate) fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}
