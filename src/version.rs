//! Dictionary version markers.
//!
//! A [`DictionaryVersion`] is the last-modification instant reported by the
//! store, in milliseconds since the Unix epoch. Versions only ever move
//! forward: a reload is due when an observed version is strictly greater
//! than the one already held.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynonymError};
use crate::store::connection::Value;

/// Millisecond timestamp of the last dictionary change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DictionaryVersion(i64);

impl DictionaryVersion {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    /// Whether `self` should replace `held`.
    ///
    /// Anything is newer than no version at all; otherwise only a strictly
    /// greater timestamp counts, so equal observations never trigger work.
    pub fn is_newer_than(&self, held: Option<DictionaryVersion>) -> bool {
        match held {
            None => true,
            Some(held) => *self > held,
        }
    }

    /// Interpret a `last_modify_dt` column value.
    ///
    /// Integers are epoch milliseconds, reals are epoch milliseconds with a
    /// fractional part, and text is parsed as a timestamp (naive values are
    /// taken as UTC). `NULL` yields `None`.
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Integer(millis) => Ok(Some(Self(*millis))),
            Value::Real(millis) => Ok(Some(Self(millis.trunc() as i64))),
            other => match other.as_text() {
                Some(text) => Self::parse(text).map(Some),
                None => Err(SynonymError::other(format!(
                    "last_modify_dt is not a timestamp: {other}"
                ))),
            },
        }
    }

    /// Parse a textual timestamp.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`,
    /// `YYYY-MM-DDTHH:MM:SS[.fff]` and a plain `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::from_datetime(&dt));
        }
        for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::from_datetime(&naive.and_utc()));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            && let Some(naive) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(Self::from_datetime(&naive.and_utc()));
        }
        if let Ok(millis) = text.parse::<i64>() {
            return Ok(Self(millis));
        }

        Err(SynonymError::other(format!(
            "unrecognized timestamp '{text}'"
        )))
    }
}

impl fmt::Display for DictionaryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Outcome of asking the store for its current version.
///
/// "The store answered but has no version" is [`VersionLookup::NotFound`];
/// "the store could not be asked" is an `Err` from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLookup {
    Found(DictionaryVersion),
    NotFound,
}

impl VersionLookup {
    pub fn version(&self) -> Option<DictionaryVersion> {
        match self {
            VersionLookup::Found(v) => Some(*v),
            VersionLookup::NotFound => None,
        }
    }
}
