//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with a single table:
//! - items(id, title, description)
//!
//! A `Database` is established once at startup; every request opens its
//! own `ItemStore` session from it and drops the session when done.

pub mod database;
pub mod schema;
pub mod sqlite;

pub use database::{connect_with_retry, DataSource, Database, RetryPolicy};
pub use sqlite::{ItemStore, DEFAULT_LIMIT};
