//! Driver selection from the `jdbc.driver` setting.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, SynonymError};
use crate::store::connection::ConnectionFactory;
use crate::store::mysql::MysqlConnectionFactory;
use crate::store::sqlite::SqliteConnectionFactory;

/// Built-in store drivers.
///
/// Stores without a built-in driver are reached by handing a custom
/// [`ConnectionFactory`] to the pool directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Mysql,
}

impl Driver {
    pub fn factory(&self) -> Arc<dyn ConnectionFactory> {
        match self {
            Driver::Sqlite => Arc::new(SqliteConnectionFactory::new()),
            Driver::Mysql => Arc::new(MysqlConnectionFactory::new()),
        }
    }
}

impl FromStr for Driver {
    type Err = SynonymError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" | "org.sqlite.jdbc" => Ok(Driver::Sqlite),
            "mysql" | "com.mysql.jdbc.driver" | "com.mysql.cj.jdbc.driver" => Ok(Driver::Mysql),
            other => Err(SynonymError::config(format!(
                "unsupported jdbc.driver '{other}'; supply a custom ConnectionFactory"
            ))),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => write!(f, "sqlite"),
            Driver::Mysql => write!(f, "mysql"),
        }
    }
}
