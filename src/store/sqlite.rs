//! SQLite backend built on `rusqlite`.
//!
//! Accepted URL forms: `sqlite://<path>`, `sqlite:<path>`,
//! `jdbc:sqlite:<path>` and a bare path. `:memory:` opens a private
//! in-memory database. Databases are opened read-only; a missing file is a
//! connection error rather than a silently created empty store.

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;
use tracing::debug;

use crate::config::JdbcSettings;
use crate::error::{Result, SynonymError};
use crate::store::connection::{Connection, ConnectionFactory, Row, Value};

/// Opens read-only SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    busy_timeout: Duration,
}

impl Default for SqliteConnectionFactory {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl SqliteConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a statement waits on a locked database before failing.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Strip the scheme prefixes from a connection URL.
    pub fn database_path(url: &str) -> Result<PathBuf> {
        let trimmed = url.trim();
        let path = ["jdbc:sqlite:", "sqlite://", "sqlite:"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        if path.is_empty() {
            return Err(SynonymError::config(format!(
                "sqlite url '{url}' does not name a database"
            )));
        }
        Ok(PathBuf::from(path))
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    fn connect(&self, settings: &JdbcSettings) -> Result<Box<dyn Connection>> {
        let path = Self::database_path(&settings.url)?;
        if !settings.user.is_empty() {
            debug!(user = %settings.user, "sqlite ignores jdbc.user and jdbc.password");
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = rusqlite::Connection::open_with_flags(&path, flags).map_err(|e| {
            SynonymError::connection(format!("cannot open {}: {e}", path.display()))
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| SynonymError::connection(e.to_string()))?;

        Ok(Box::new(SqliteConnection { conn }))
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// One open SQLite database handle.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    fn collect_rows(&self, sql: &str) -> rusqlite::Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(match row.get_ref(idx)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::Integer(v),
                    ValueRef::Real(v) => Value::Real(v),
                    ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
                    ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
                });
            }
            out.push(Row::new(columns.clone(), values));
        }
        Ok(out)
    }
}

impl Connection for SqliteConnection {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.collect_rows(sql).map_err(|e| match SynonymError::from(e) {
            SynonymError::Query { message, .. } => SynonymError::query(message, sql),
            other => other,
        })
    }

    fn is_valid(&mut self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| SynonymError::from(e))
    }
}
