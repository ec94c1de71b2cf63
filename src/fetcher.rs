//! Full-dictionary fetch.

use std::fmt;
use std::io::Cursor;

use tracing::{debug, info};

use crate::error::{Result, SynonymError};
use crate::store::connection::Connection;

/// Column the reload statement must return.
pub const WORD_COLUMN: &str = "word";

/// Line separator used when assembling rule text.
pub const LINE_SEPARATOR: char = '\n';

/// Rule text, one entry per line, in the order it was fetched.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawDictionaryText {
    text: String,
    entries: usize,
}

impl RawDictionaryText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry followed by the line separator.
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push(LINE_SEPARATOR);
        self.entries += 1;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    /// Number of entries appended (or lines, for text built from a string).
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// A readable stream over the text.
    pub fn reader(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.text.clone().into_bytes())
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl From<String> for RawDictionaryText {
    fn from(text: String) -> Self {
        let entries = text.lines().count();
        Self { text, entries }
    }
}

impl From<&str> for RawDictionaryText {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl fmt::Debug for RawDictionaryText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDictionaryText")
            .field("entries", &self.entries)
            .field("bytes", &self.text.len())
            .finish()
    }
}

/// Runs the configured reload statement and assembles rule text.
#[derive(Debug, Clone)]
pub struct DictionaryFetcher {
    sql: String,
}

impl DictionaryFetcher {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Fetch every rule row. `NULL` words are skipped; an empty result gives
    /// empty text.
    pub fn fetch_all(&self, conn: &mut dyn Connection) -> Result<RawDictionaryText> {
        info!(sql = %self.sql, "fetching synonym rules");
        let rows = conn.query(&self.sql)?;

        let mut text = RawDictionaryText::new();
        let mut skipped = 0usize;
        for row in &rows {
            let value = row.get_by_name(WORD_COLUMN).ok_or_else(|| {
                SynonymError::query(
                    format!("result has no '{WORD_COLUMN}' column"),
                    self.sql.as_str(),
                )
            })?;
            if value.is_null() {
                skipped += 1;
                continue;
            }
            match value.as_text() {
                Some(line) => text.push_line(line),
                None => {
                    return Err(SynonymError::query(
                        format!("'{WORD_COLUMN}' holds a non-text value: {value}"),
                        self.sql.as_str(),
                    ));
                }
            }
        }

        if skipped > 0 {
            debug!(skipped, "skipped NULL synonym rows");
        }
        info!(total = text.entry_count(), "loaded synonym rules");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::connection::{Row, Value};
    use std::io::Read;

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

    fn word(text: &str) -> Row {
        Row::single(WORD_COLUMN, Value::Text(text.to_string()))
    }

    #[test]
    fn test_rows_become_lines_in_order() {
        let mut conn = Scripted(vec![
            word("fast,quick"),
            Row::single(WORD_COLUMN, Value::Null),
            word("car,automobile"),
        ]);
        let text = DictionaryFetcher::new("q").fetch_all(&mut conn).unwrap();

        assert_eq!(text.as_str(), "fast,quick\ncar,automobile\n");
        assert_eq!(text.entry_count(), 2);

        let mut read_back = String::new();
        text.reader().read_to_string(&mut read_back).unwrap();
        assert_eq!(read_back, text.as_str());
    }

    #[test]
    fn test_empty_result_is_empty_text() {
        let text = DictionaryFetcher::new("q")
            .fetch_all(&mut Scripted(vec![]))
            .unwrap();
        assert!(text.is_empty());
        assert_eq!(text.entry_count(), 0);
    }

    #[test]
    fn test_wrong_column_is_query_error() {
        let mut conn = Scripted(vec![Row::single("words", Value::Text("a,b".into()))]);
        let err = DictionaryFetcher::new("SELECT words FROM t")
            .fetch_all(&mut conn)
            .unwrap_err();
        assert!(matches!(err, SynonymError::Query { .. }));
    }
}
