//! Integration tests driving the full router over in-memory stores.

mod helpers;

mod auth_test;
mod discussion_test;
mod repository_test;
