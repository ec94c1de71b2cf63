//! Connection abstractions for the dictionary store.
//!
//! A [`ConnectionFactory`] opens [`Connection`]s; the pool owns them and
//! leases them out. Queries return fully materialized [`Row`]s, which keeps
//! result cursors scoped to a single `query` call.

use std::fmt;

use crate::config::JdbcSettings;
use crate::error::Result;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text content, decoding UTF-8 blobs.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Blob(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// A result row: column names with their values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Convenience constructor for a one-column row.
    pub fn single(column: impl Into<String>, value: Value) -> Self {
        Self::new(vec![column.into()], vec![value])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value by column index.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value by column name, compared case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }
}

/// A live connection to the dictionary store.
///
/// Connections are used by one thread at a time (the pool hands out
/// exclusive leases), so methods take `&mut self`.
pub trait Connection: Send {
    /// Run a read-only statement and collect every row.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Liveness check run before reusing an idle connection.
    fn is_valid(&mut self) -> bool;

    /// Close the connection, reporting errors raised while doing so.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Opens new connections for the pool.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self, settings: &JdbcSettings) -> Result<Box<dyn Connection>>;

    /// Name used in log output.
    fn name(&self) -> &str {
        "custom"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_by_name() {
        let row = Row::new(
            vec!["id".to_string(), "WORD".to_string()],
            vec![Value::Integer(1), Value::Text("fast,quick".to_string())],
        );
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_by_name("word").and_then(Value::as_text), Some("fast,quick"));
        assert_eq!(row.get(0), Some(&Value::Integer(1)));
        assert!(row.get_by_name("missing").is_none());
    }

    #[test]
    fn test_value_text_from_blob() {
        assert_eq!(Value::Blob(b"car,auto".to_vec()).as_text(), Some("car,auto"));
        assert_eq!(Value::Blob(vec![0xff, 0xfe]).as_text(), None);
        assert_eq!(Value::Integer(3).as_text(), None);
        assert!(Value::Null.is_null());
    }
}
