//! Change detection against the dictionary store.

use tracing::debug;

use crate::error::{Result, SynonymError};
use crate::store::connection::Connection;
use crate::version::{DictionaryVersion, VersionLookup};

/// Column the last-modified statement must return.
pub const LAST_MODIFY_COLUMN: &str = "last_modify_dt";

/// Runs the configured last-modified statement and reads the version.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    sql: String,
}

impl ChangeDetector {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Ask the store for its current version.
    ///
    /// Zero rows, or rows whose column is `NULL` (an aggregate over an empty
    /// table), report [`VersionLookup::NotFound`]. If several rows come
    /// back the greatest timestamp wins.
    pub fn latest_version(&self, conn: &mut dyn Connection) -> Result<VersionLookup> {
        let rows = conn.query(&self.sql)?;

        let mut latest: Option<DictionaryVersion> = None;
        for row in &rows {
            let value = row.get_by_name(LAST_MODIFY_COLUMN).ok_or_else(|| {
                SynonymError::query(
                    format!("result has no '{LAST_MODIFY_COLUMN}' column"),
                    self.sql.as_str(),
                )
            })?;
            let version = DictionaryVersion::from_value(value)
                .map_err(|e| SynonymError::query(e.to_string(), self.sql.as_str()))?;
            latest = latest.max(version);
        }

        match latest {
            Some(version) => {
                debug!(%version, rows = rows.len(), "read dictionary last-modified time");
                Ok(VersionLookup::Found(version))
            }
            None => {
                debug!(rows = rows.len(), "store reported no last-modified time");
                Ok(VersionLookup::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::connection::{Row, Value};

    struct Scripted(Vec<Row>);

    impl Connection for Scripted {
        fn query(&mut self, _sql: &str) -> Result<Vec<Row>> {
            Ok(self.0.clone())
        }

        fn is_valid(&mut self) -> bool {
            true
        }

        fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn row(value: Value) -> Row {
        Row::single(LAST_MODIFY_COLUMN, value)
    }

    #[test]
    fn test_single_row() {
        let mut conn = Scripted(vec![row(Value::Text("2024-01-01T00:00:00".into()))]);
        let lookup = ChangeDetector::new("q").latest_version(&mut conn).unwrap();
        assert_eq!(
            lookup,
            VersionLookup::Found(DictionaryVersion::from_millis(1_704_067_200_000))
        );
    }

    #[test]
    fn test_empty_and_null_are_not_found() {
        let detector = ChangeDetector::new("q");
        assert_eq!(
            detector.latest_version(&mut Scripted(vec![])).unwrap(),
            VersionLookup::NotFound
        );
        assert_eq!(
            detector
                .latest_version(&mut Scripted(vec![row(Value::Null)]))
                .unwrap(),
            VersionLookup::NotFound
        );
    }

    #[test]
    fn test_greatest_row_wins() {
        let mut conn = Scripted(vec![row(Value::Integer(5)), row(Value::Integer(9)), row(Value::Integer(7))]);
        let lookup = ChangeDetector::new("q").latest_version(&mut conn).unwrap();
        assert_eq!(lookup.version(), Some(DictionaryVersion::from_millis(9)));
    }

    #[test]
    fn test_missing_column_is_query_error() {
        let mut conn = Scripted(vec![Row::single("updated", Value::Integer(1))]);
        let err = ChangeDetector::new("SELECT updated FROM t")
            .latest_version(&mut conn)
            .unwrap_err();
        match err {
            SynonymError::Query { sql, .. } => assert_eq!(sql, "SELECT updated FROM t"),
            other => panic!("expected query error, got {other:?}"),
        }
    }
}
