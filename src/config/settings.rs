//! Typed views over a [`ConfigurationStore`].

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::store::ConfigurationStore;
use crate::error::{Result, SynonymError};
use crate::synonym::compiler::{CompilerOptions, SynonymFormat};

pub const JDBC_URL: &str = "jdbc.url";
pub const JDBC_USER: &str = "jdbc.user";
pub const JDBC_PASSWORD: &str = "jdbc.password";
pub const JDBC_DRIVER: &str = "jdbc.driver";
pub const LAST_MODIFIED_SQL: &str = "jdbc.lastModified.synonym.sql";
pub const RELOAD_SQL: &str = "jdbc.reload.synonym.sql";

pub const MAX_ACTIVE: &str = "jdbc.maxActive";
pub const INITIAL_SIZE: &str = "jdbc.initialSize";
pub const MAX_WAIT: &str = "jdbc.maxWait";
pub const MIN_IDLE: &str = "jdbc.minIdle";
pub const RETRY_ATTEMPTS: &str = "jdbc.connectionErrorRetryAttempts";
pub const BREAK_AFTER_ACQUIRE_FAILURE: &str = "jdbc.breakAfterAcquireFailure";
pub const TIME_BETWEEN_CONNECT_ERROR: &str = "jdbc.timeBetweenConnectErrorMillis";

pub const SYNONYM_INTERVAL: &str = "synonym.interval";
pub const SYNONYM_LOCATION: &str = "synonym.location";
pub const SYNONYM_FORMAT: &str = "synonym.format";
pub const SYNONYM_EXPAND: &str = "synonym.expand";
pub const SYNONYM_LENIENT: &str = "synonym.lenient";
pub const SYNONYM_IGNORE_CASE: &str = "synonym.ignore_case";

/// Connection parameters and the two polling statements.
#[derive(Clone, Serialize, Deserialize)]
pub struct JdbcSettings {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub driver: String,
    /// Returns at most one row with a `last_modify_dt` column.
    pub last_modified_sql: String,
    /// Returns one `word` column per synonym rule.
    pub reload_sql: String,
}

impl JdbcSettings {
    /// Read the `jdbc.*` keys. `user` and `password` may be absent for
    /// stores that do not authenticate.
    pub fn from_store(store: &ConfigurationStore) -> Result<Self> {
        Ok(Self {
            url: store.require(JDBC_URL)?.trim().to_string(),
            user: store.get(JDBC_USER).unwrap_or_default().to_string(),
            password: store.get(JDBC_PASSWORD).unwrap_or_default().to_string(),
            driver: store.require(JDBC_DRIVER)?.trim().to_string(),
            last_modified_sql: store.require(LAST_MODIFIED_SQL)?.trim().to_string(),
            reload_sql: store.require(RELOAD_SQL)?.trim().to_string(),
        })
    }
}

impl fmt::Debug for JdbcSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JdbcSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("driver", &self.driver)
            .field("last_modified_sql", &self.last_modified_sql)
            .field("reload_sql", &self.reload_sql)
            .finish()
    }
}

/// Connection pool sizing and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections leased or idle at once.
    pub max_active: usize,

    /// Connections opened eagerly when the pool is created.
    pub initial_size: usize,

    /// Idle connections kept open by eviction.
    pub min_idle: usize,

    /// Maximum time `acquire` blocks waiting for a free slot.
    pub max_wait: Duration,

    /// Connect attempts made per acquisition before giving up.
    pub connection_error_retry_attempts: u32,

    /// Open the circuit breaker after a failed retry cycle.
    pub break_after_acquire_failure: bool,

    /// Pause between connect attempts.
    pub time_between_connect_error: Duration,

    /// Idle connections above `min_idle` unused for longer are closed.
    pub idle_timeout: Duration,

    /// Validate idle connections before handing them out.
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_active: 10,
            initial_size: 1,
            min_idle: 2,
            max_wait: Duration::from_millis(6000),
            connection_error_retry_attempts: 5,
            break_after_acquire_failure: true,
            time_between_connect_error: Duration::from_millis(500),
            idle_timeout: Duration::from_secs(1800),
            test_on_borrow: true,
        }
    }
}

impl PoolConfig {
    /// Read the pool keys, keeping defaults for absent ones.
    pub fn from_store(store: &ConfigurationStore) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            max_active: store.parse_or(MAX_ACTIVE, defaults.max_active)?,
            initial_size: store.parse_or(INITIAL_SIZE, defaults.initial_size)?,
            min_idle: store.parse_or(MIN_IDLE, defaults.min_idle)?,
            max_wait: Duration::from_millis(
                store.parse_or(MAX_WAIT, defaults.max_wait.as_millis() as u64)?,
            ),
            connection_error_retry_attempts: store
                .parse_or(RETRY_ATTEMPTS, defaults.connection_error_retry_attempts)?,
            break_after_acquire_failure: store
                .parse_or(BREAK_AFTER_ACQUIRE_FAILURE, defaults.break_after_acquire_failure)?,
            time_between_connect_error: Duration::from_millis(store.parse_or(
                TIME_BETWEEN_CONNECT_ERROR,
                defaults.time_between_connect_error.as_millis() as u64,
            )?),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes the pool cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_active == 0 {
            return Err(SynonymError::config("jdbc.maxActive must be at least 1"));
        }
        if self.initial_size > self.max_active {
            return Err(SynonymError::config(format!(
                "jdbc.initialSize ({}) exceeds jdbc.maxActive ({})",
                self.initial_size, self.max_active
            )));
        }
        if self.connection_error_retry_attempts == 0 {
            return Err(SynonymError::config(
                "jdbc.connectionErrorRetryAttempts must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    pub fn with_initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.connection_error_retry_attempts = attempts;
        self
    }

    pub fn with_break_after_acquire_failure(mut self, enabled: bool) -> Self {
        self.break_after_acquire_failure = enabled;
        self
    }

    pub fn with_time_between_connect_error(mut self, pause: Duration) -> Self {
        self.time_between_connect_error = pause;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_test_on_borrow(mut self, enabled: bool) -> Self {
        self.test_on_borrow = enabled;
        self
    }

    /// How long the breaker stays open after a failed retry cycle.
    pub fn break_duration(&self) -> Duration {
        self.time_between_connect_error * self.connection_error_retry_attempts
    }
}

/// Polling and compilation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Time between update checks, written as whole seconds.
    #[serde(with = "duration_secs")]
    pub interval: Duration,

    /// Where rules come from: `fromDB` for the database, otherwise a file path.
    pub location: String,

    /// Rule parsing options.
    pub compiler: CompilerOptions,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            location: "fromDB".to_string(),
            compiler: CompilerOptions::default(),
        }
    }
}

impl ReloadConfig {
    pub fn from_store(store: &ConfigurationStore) -> Result<Self> {
        let defaults = Self::default();
        let interval_secs: u64 = store.parse_or(SYNONYM_INTERVAL, defaults.interval.as_secs())?;
        if interval_secs == 0 {
            return Err(SynonymError::config("synonym.interval must be at least 1 second"));
        }

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            location: store
                .get(SYNONYM_LOCATION)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.location),
            compiler: CompilerOptions {
                format: store.parse_or(SYNONYM_FORMAT, SynonymFormat::Solr)?,
                expand: store.parse_or(SYNONYM_EXPAND, defaults.compiler.expand)?,
                lenient: store.parse_or(SYNONYM_LENIENT, defaults.compiler.lenient)?,
                ignore_case: store.parse_or(SYNONYM_IGNORE_CASE, defaults.compiler.ignore_case)?,
            },
        })
    }

    /// Read settings from a JSON document; absent fields keep defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        if config.interval.is_zero() {
            return Err(SynonymError::config("interval must be at least 1 second"));
        }
        Ok(config)
    }
}

/// Serde adapter storing a [`Duration`] as an integer number of seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
