//! Error types for dynamic-synonym.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! [`SynonymError`] enum. The variants follow the failure taxonomy of the
//! reload pipeline: configuration, connectivity, pool backpressure, query
//! execution and rule compilation.
//!
//! # Examples
//!
//! ```
//! use dynamic_synonym::error::{Result, SynonymError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SynonymError::config("jdbc.url is empty"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for dynamic-synonym operations.
#[derive(Error, Debug)]
pub enum SynonymError {
    /// I/O errors (reading configuration or rule files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration resource does not exist
    #[error("Configuration missing: {}", path.display())]
    ConfigMissing { path: PathBuf },

    /// A configuration value is absent or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backing store is unreachable or rejected the credentials
    #[error("Connection error: {0}")]
    Connection(String),

    /// No pooled connection became available in time
    #[error("Pool exhausted: {0}")]
    PoolExhausted(String),

    /// A statement failed or returned an unexpected shape
    #[error("Query error: {message} (sql: {sql})")]
    Query { message: String, sql: String },

    /// Synonym rules could not be compiled
    #[error("Compile error at line {line}: {message}")]
    Compile { line: usize, message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SynonymError.
pub type Result<T> = std::result::Result<T, SynonymError>;

impl SynonymError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SynonymError::Config(msg.into())
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        SynonymError::Connection(msg.into())
    }

    /// Create a new pool exhausted error.
    pub fn pool_exhausted<S: Into<String>>(msg: S) -> Self {
        SynonymError::PoolExhausted(msg.into())
    }

    /// Create a new query error carrying the offending statement.
    pub fn query<M: Into<String>, S: Into<String>>(msg: M, sql: S) -> Self {
        SynonymError::Query {
            message: msg.into(),
            sql: sql.into(),
        }
    }

    /// Create a new compile error for a 1-based rule line.
    pub fn compile<S: Into<String>>(line: usize, msg: S) -> Self {
        SynonymError::Compile {
            line,
            message: msg.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SynonymError::Other(msg.into())
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SynonymError::Connection(_) | SynonymError::PoolExhausted(_)
        )
    }
}

impl From<rusqlite::Error> for SynonymError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::NotADatabase
                        | rusqlite::ErrorCode::PermissionDenied
                        | rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                SynonymError::Connection(err.to_string())
            }
            other => SynonymError::Query {
                message: other.to_string(),
                sql: String::new(),
            },
        }
    }
}

impl From<mysql::Error> for SynonymError {
    fn from(err: mysql::Error) -> Self {
        match err {
            // Errors reported by the server are about the statement.
            mysql::Error::MySqlError(server) => SynonymError::Query {
                message: server.to_string(),
                sql: String::new(),
            },
            other => SynonymError::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SynonymError::config("jdbc.url is empty");
        assert_eq!(error.to_string(), "Configuration error: jdbc.url is empty");

        let error = SynonymError::query("no such column: word", "SELECT w FROM t");
        assert_eq!(
            error.to_string(),
            "Query error: no such column: word (sql: SELECT w FROM t)"
        );

        let error = SynonymError::compile(3, "empty mapping target");
        assert_eq!(
            error.to_string(),
            "Compile error at line 3: empty mapping target"
        );
    }

    #[test]
    fn test_retriable_classification() {
        assert!(SynonymError::connection("refused").is_retriable());
        assert!(SynonymError::pool_exhausted("timeout").is_retriable());
        assert!(!SynonymError::compile(1, "bad").is_retriable());
        assert!(!SynonymError::config("missing").is_retriable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = SynonymError::from(io_error);

        match error {
            SynonymError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_sqlite_cannot_open_is_connection_error() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            None,
        );
        assert!(matches!(
            SynonymError::from(err),
            SynonymError::Connection(_)
        ));
    }
}
