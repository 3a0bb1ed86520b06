//! # Items API - minimal CRUD service for a single resource
//!
//! Items (`title`, `description`) are stored in SQLite and exposed over
//! HTTP with create, read, list, partial update and delete endpoints.
//!
//! Items API provides:
//! - Typed request/response shapes with validation at the boundary
//! - A transactional access layer over SQLite
//! - An axum router mapping every outcome to an explicit status code
//! - Startup connectivity checks with a fixed retry budget

pub mod item;
pub mod storage;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use item::{DeleteConfirmation, Item, ItemId, ItemPatch, NewItem};
pub use storage::{Database, DataSource, ItemStore, RetryPolicy};

/// Result type alias for Items API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Items API operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid connection string: {0}")]
    InvalidDataSource(String),

    #[error("Database {target} unreachable after {attempts} attempts: {reason}")]
    Unavailable {
        target: String,
        attempts: u32,
        reason: String,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}
