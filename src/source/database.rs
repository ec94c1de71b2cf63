//! Dictionary stored in a relational database and read through the pool.

use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigurationStore, JdbcSettings, PoolConfig, ReloadConfig};
use crate::detector::ChangeDetector;
use crate::error::{Result, SynonymError};
use crate::fetcher::{DictionaryFetcher, RawDictionaryText};
use crate::pool::{ConnectionPool, PooledConnection};
use crate::source::reloadable::{DictionaryBackend, ReloadableSource};
use crate::store::connection::ConnectionFactory;
use crate::store::driver::Driver;
use crate::synonym::compiler::{RuleCompiler, SynonymCompiler};
use crate::version::VersionLookup;

/// Reload machine over a pooled database.
pub type DatabaseSynonymSource = ReloadableSource<DatabaseBackend>;

/// Runs the last-modified and reload statements on pooled connections.
pub struct DatabaseBackend {
    pool: Arc<ConnectionPool>,
    detector: ChangeDetector,
    fetcher: DictionaryFetcher,
}

impl DatabaseBackend {
    pub fn new(pool: Arc<ConnectionPool>, settings: &JdbcSettings) -> Self {
        Self {
            pool,
            detector: ChangeDetector::new(settings.last_modified_sql.clone()),
            fetcher: DictionaryFetcher::new(settings.reload_sql.clone()),
        }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn fetcher(&self) -> &DictionaryFetcher {
        &self.fetcher
    }

    /// Run `op` on a leased connection. The lease is dropped before this
    /// returns; connection-level failures retire the connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut PooledConnection) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.pool.acquire()?;
        let result = op(&mut conn);
        if let Err(SynonymError::Connection(message)) = &result {
            debug!(%message, "retiring connection after failure");
            conn.mark_broken();
        }
        result
    }
}

impl DictionaryBackend for DatabaseBackend {
    fn latest_version(&self) -> Result<VersionLookup> {
        self.with_connection(|conn| self.detector.latest_version(&mut **conn))
    }

    fn fetch(&self) -> Result<RawDictionaryText> {
        self.with_connection(|conn| self.fetcher.fetch_all(&mut **conn))
    }

    fn describe(&self) -> String {
        format!("database:{}", self.pool.settings().url)
    }
}

impl ReloadableSource<DatabaseBackend> {
    /// Build the pool, detector and fetcher from configuration, using the
    /// built-in driver named by `jdbc.driver`.
    pub fn from_config(store: &ConfigurationStore, reload: &ReloadConfig) -> Result<Self> {
        let settings = JdbcSettings::from_store(store)?;
        let factory = settings.driver.parse::<Driver>()?.factory();
        Self::with_factory(store, reload, factory)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied driver.
    pub fn with_factory(
        store: &ConfigurationStore,
        reload: &ReloadConfig,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self> {
        let settings = JdbcSettings::from_store(store)?;
        let pool = ConnectionPool::new(PoolConfig::from_store(store)?, settings.clone(), factory)?;
        let compiler: Arc<dyn SynonymCompiler> = Arc::new(RuleCompiler::new(reload.compiler.clone()));
        Ok(Self::new(DatabaseBackend::new(pool, &settings), compiler))
    }
}
