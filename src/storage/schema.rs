//! Database schema definitions

/// SQL to create the items table.
///
/// `AUTOINCREMENT` keeps ids monotonic: an id freed by a delete is never
/// handed out again.
pub const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT
)
"#;
