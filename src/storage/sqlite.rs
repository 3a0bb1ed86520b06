//! SQLite item store - one session per request

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use crate::item::{Item, ItemId, ItemPatch, NewItem};
use crate::Result;
use super::schema;

/// Page size used when a caller does not supply `limit`
pub const DEFAULT_LIMIT: u64 = 100;

const SELECT_COLUMNS: &str = "SELECT id, title, description FROM items";

/// SQLite-backed access to the items table.
///
/// Every mutating operation runs in its own transaction: it either commits
/// as a whole or is rolled back and the storage error is returned.
/// Transactions are IMMEDIATE, so concurrent writers queue on the busy
/// timeout instead of failing on a read-to-write lock upgrade.
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Wrap an already opened connection
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a private in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    // ========== Item Operations ==========

    /// Insert a new item and return it with its generated id
    pub fn create(&mut self, new_item: &NewItem) -> Result<Item> {
        let item = self.in_transaction("create", |tx| {
            tx.execute(
                "INSERT INTO items (title, description) VALUES (?1, ?2)",
                params![new_item.title, new_item.description],
            )?;
            let id = tx.last_insert_rowid();
            Ok(fetch(tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
        })?;

        tracing::debug!(id = item.id, "Created item");
        Ok(item)
    }

    /// Get an item by id
    pub fn get(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(fetch(&self.conn, id)?)
    }

    /// List items in insertion order, skipping `skip` and returning at most `limit`
    pub fn list(&self, skip: u64, limit: u64) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY id LIMIT ?1 OFFSET ?2"
        ))?;

        let items = stmt
            .query_map(params![clamp(limit), clamp(skip)], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(items)
    }

    /// Apply the supplied fields of `patch`, returning `None` if the id is unknown
    pub fn update(&mut self, id: ItemId, patch: &ItemPatch) -> Result<Option<Item>> {
        let updated = self.in_transaction("update", |tx| {
            let Some(mut item) = fetch(tx, id)? else {
                return Ok(None);
            };
            if patch.is_empty() {
                return Ok(Some(item));
            }

            patch.apply(&mut item);
            tx.execute(
                "UPDATE items SET title = ?1, description = ?2 WHERE id = ?3",
                params![item.title, item.description, id],
            )?;
            Ok(fetch(tx, id)?)
        })?;

        tracing::debug!(id, found = updated.is_some(), "Updated item");
        Ok(updated)
    }

    /// Delete an item, returning whether it existed
    pub fn delete(&mut self, id: ItemId) -> Result<bool> {
        let removed = self.in_transaction("delete", |tx| {
            Ok(tx.execute("DELETE FROM items WHERE id = ?1", [id])? > 0)
        })?;

        tracing::debug!(id, removed, "Deleted item");
        Ok(removed)
    }

    /// Count all items
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Transactions ==========

    fn in_transaction<T>(
        &mut self,
        operation: &str,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "Rolling back transaction");
                if let Err(rollback) = tx.rollback() {
                    tracing::error!(operation, error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Create the schema if it does not exist yet
pub(crate) fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(schema::CREATE_ITEMS_TABLE, [])?;
    Ok(())
}

fn fetch(conn: &Connection, id: ItemId) -> rusqlite::Result<Option<Item>> {
    conn.query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], row_to_item)
        .optional()
}

/// Helper to convert a row to an Item
fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
    })
}

// SQLite takes signed 64-bit LIMIT/OFFSET values
fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
