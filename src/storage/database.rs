//! Database handle and startup connectivity
//!
//! The handle is created once during startup and shared by every request.
//! It never hands out a shared connection: `session()` opens a fresh one
//! that is closed when the returned `ItemStore` is dropped.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;

use super::sqlite::{initialize_schema, ItemStore};
use crate::{Error, Result};

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// How long a session waits on a locked database file before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the items live, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// In-memory database, alive as long as its `Database` handle
    Memory,
    /// Database file on disk
    File(PathBuf),
}

impl DataSource {
    /// Parse a connection string.
    ///
    /// Accepted forms: `sqlite::memory:`, `:memory:`, `sqlite://<path>`,
    /// `sqlite:<path>` and a bare path.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidDataSource("connection string is empty".to_string()));
        }
        if s == ":memory:" || s == "sqlite::memory:" {
            return Ok(DataSource::Memory);
        }

        let path = if let Some(rest) = s.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = s.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = s.split_once("://") {
            return Err(Error::InvalidDataSource(format!("unsupported scheme: {}", scheme)));
        } else {
            s
        };

        if path.is_empty() {
            return Err(Error::InvalidDataSource(format!("no database path in {:?}", s)));
        }
        Ok(DataSource::File(PathBuf::from(path)))
    }
}

impl FromStr for DataSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataSource::parse(s)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Memory => write!(f, "sqlite::memory:"),
            DataSource::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

/// Connected database, reachable and with its schema in place.
pub struct Database {
    source: DataSource,
    target: String,
    // Keeps a shared in-memory database alive between sessions
    _anchor: Option<Mutex<Connection>>,
}

impl Database {
    /// Connect once: open the data source, check it answers and create the schema
    pub fn connect(source: DataSource) -> Result<Self> {
        let (target, is_memory) = match &source {
            DataSource::Memory => {
                let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
                let uri = format!(
                    "file:items-api-{}-{}?mode=memory&cache=shared",
                    std::process::id(),
                    n
                );
                (uri, true)
            }
            DataSource::File(path) => (path.to_string_lossy().into_owned(), false),
        };

        let conn = open_connection(&target)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        initialize_schema(&conn)?;

        tracing::debug!(source = %source, "Connected to database");

        Ok(Self {
            source,
            target,
            _anchor: is_memory.then(|| Mutex::new(conn)),
        })
    }

    /// Connect to a fresh in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::connect(DataSource::Memory)
    }

    /// Open a new session; it is closed when dropped
    pub fn session(&self) -> Result<ItemStore> {
        Ok(ItemStore::new(open_connection(&self.target)?))
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }
}

fn open_connection(target: &str) -> Result<Connection> {
    let conn = Connection::open(target)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Fixed retry budget for the startup connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Connect to `source`, waiting `policy.delay` between failed attempts.
///
/// Returns `Error::Unavailable` once every attempt has failed.
pub async fn connect_with_retry(source: &DataSource, policy: &RetryPolicy) -> Result<Database> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match Database::connect(source.clone()) {
            Ok(db) => {
                tracing::info!(source = %source, attempt, "Database is reachable");
                return Ok(db);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    source = %source,
                    attempt,
                    attempts,
                    error = %e,
                    "Database not reachable, retrying in {:?}",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(Error::Unavailable {
                    target: source.to_string(),
                    attempts,
                    reason: e.to_string(),
                });
            }
        }
    }
}
