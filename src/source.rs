//! Reloadable synonym dictionaries.
//!
//! A source knows how to tell whether its stored dictionary changed and how
//! to rebuild the published [`SynonymTable`] from it. Two stores are
//! supported: a database reached through the connection pool, and a plain
//! rules file.
//!
//! # Examples
//!
//! ```no_run
//! use dynamic_synonym::config::{ConfigurationStore, ReloadConfig};
//! use dynamic_synonym::source::{SourceKind, SynonymSource};
//!
//! let store = ConfigurationStore::from_install_dir()?;
//! let reload = ReloadConfig::from_store(&store)?;
//! let source = SourceKind::from_config(&store, &reload)?;
//!
//! if source.needs_reload() {
//!     let table = source.reload_synonym_table()?;
//!     println!("{} terms", table.len());
//! }
//! # Ok::<(), dynamic_synonym::error::SynonymError>(())
//! ```

pub mod database;
pub mod file;
pub mod handle;
pub mod reloadable;

use std::io::Cursor;
use std::sync::Arc;

use crate::config::{ConfigurationStore, ReloadConfig};
use crate::error::{Result, SynonymError};
use crate::fetcher::RawDictionaryText;
use crate::synonym::table::SynonymTable;
use crate::version::DictionaryVersion;

pub use database::{DatabaseBackend, DatabaseSynonymSource};
pub use file::{FileBackend, FileSynonymSource};
pub use handle::SynonymTableHandle;
pub use reloadable::{DictionaryBackend, ReloadableSource, SourceState};

/// What a tokenizer needs from a dictionary.
pub trait SynonymSource: Send + Sync {
    /// True when the stored dictionary is strictly newer than the held one.
    fn needs_reload(&self) -> bool;

    /// Rebuild and publish the table.
    fn reload_synonym_table(&self) -> Result<Arc<SynonymTable>>;

    /// Fresh raw rule text.
    fn raw_text(&self) -> Result<RawDictionaryText>;

    fn handle(&self) -> SynonymTableHandle;

    /// Readable stream over the raw rule text.
    fn reader(&self) -> Result<Cursor<Vec<u8>>> {
        Ok(self.raw_text()?.reader())
    }

    fn current(&self) -> Arc<SynonymTable> {
        self.handle().current()
    }
}

impl<B: DictionaryBackend> SynonymSource for ReloadableSource<B> {
    fn needs_reload(&self) -> bool {
        self.check_for_update()
    }

    fn reload_synonym_table(&self) -> Result<Arc<SynonymTable>> {
        self.reload()
    }

    fn raw_text(&self) -> Result<RawDictionaryText> {
        ReloadableSource::raw_text(self)
    }

    fn handle(&self) -> SynonymTableHandle {
        ReloadableSource::handle(self)
    }
}

/// Locations that select the database store.
const DATABASE_LOCATIONS: [&str; 3] = ["fromdb", "frommysql", "jdbc"];

/// Source chosen from `synonym.location`.
#[derive(Debug)]
pub enum SourceKind {
    Database(DatabaseSynonymSource),
    File(FileSynonymSource),
}

impl SourceKind {
    pub fn from_config(store: &ConfigurationStore, reload: &ReloadConfig) -> Result<Self> {
        let location = reload.location.trim();
        let lowered = location.to_ascii_lowercase();

        if DATABASE_LOCATIONS.contains(&lowered.as_str()) {
            return Ok(SourceKind::Database(DatabaseSynonymSource::from_config(store, reload)?));
        }
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Err(SynonymError::config(format!(
                "remote synonym location '{location}' is not supported"
            )));
        }
        if location.is_empty() {
            return Err(SynonymError::config("synonym.location is empty"));
        }

        Ok(SourceKind::File(FileSynonymSource::from_path(location, reload)))
    }

    fn inner(&self) -> &dyn SynonymSource {
        match self {
            SourceKind::Database(source) => source,
            SourceKind::File(source) => source,
        }
    }

    pub fn check_for_update(&self) -> bool {
        self.needs_reload()
    }

    pub fn reload(&self) -> Result<Arc<SynonymTable>> {
        self.reload_synonym_table()
    }

    pub fn state(&self) -> SourceState {
        match self {
            SourceKind::Database(source) => source.state(),
            SourceKind::File(source) => source.state(),
        }
    }

    pub fn held_version(&self) -> Option<DictionaryVersion> {
        match self {
            SourceKind::Database(source) => source.held_version(),
            SourceKind::File(source) => source.held_version(),
        }
    }

    pub fn loaded_version(&self) -> Option<DictionaryVersion> {
        match self {
            SourceKind::Database(source) => source.loaded_version(),
            SourceKind::File(source) => source.loaded_version(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceKind::Database(source) => source.backend().describe(),
            SourceKind::File(source) => source.backend().describe(),
        }
    }
}

impl SynonymSource for SourceKind {
    fn needs_reload(&self) -> bool {
        self.inner().needs_reload()
    }

    fn reload_synonym_table(&self) -> Result<Arc<SynonymTable>> {
        self.inner().reload_synonym_table()
    }

    fn raw_text(&self) -> Result<RawDictionaryText> {
        self.inner().raw_text()
    }

    fn handle(&self) -> SynonymTableHandle {
        self.inner().handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_location() {
        let reload = ReloadConfig {
            location: "/etc/synonyms.txt".to_string(),
            ..ReloadConfig::default()
        };
        let source = SourceKind::from_config(&ConfigurationStore::empty(), &reload).unwrap();
        assert!(matches!(source, SourceKind::File(_)));
        assert_eq!(source.state(), SourceState::Unloaded);
    }

    #[test]
    fn test_remote_location_rejected() {
        let reload = ReloadConfig {
            location: "https://example.com/synonyms.txt".to_string(),
            ..ReloadConfig::default()
        };
        assert!(matches!(
            SourceKind::from_config(&ConfigurationStore::empty(), &reload),
            Err(SynonymError::Config(_))
        ));
    }

    #[test]
    fn test_database_location_needs_jdbc_keys() {
        let reload = ReloadConfig {
            location: "fromMySql".to_string(),
            ..ReloadConfig::default()
        };
        let err = SourceKind::from_config(&ConfigurationStore::empty(), &reload).unwrap_err();
        assert!(matches!(err, SynonymError::Config(_) | SynonymError::ConfigMissing { .. }));
    }
}
