//! Read-only key/value configuration loaded once at startup.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::properties;
use crate::error::{Result, SynonymError};

/// File name of the configuration resource.
pub const DB_PROPERTIES: &str = "jdbc-reload.properties";

/// Directory, relative to the install location, holding [`DB_PROPERTIES`].
pub const CONFIG_DIR: &str = "config";

/// Immutable key/value settings.
///
/// The store is built explicitly by the owning process and shared by
/// reference (or `Arc`) with every component that needs it. It is never
/// mutated after construction, so concurrent reads need no locking.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    entries: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl ConfigurationStore {
    /// Create an empty store. Every key resolves to `None`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from literal pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source: None,
        }
    }

    /// Load a properties file.
    ///
    /// A missing file is not fatal: a warning is logged and an empty store is
    /// returned so that downstream components report a configuration error
    /// when they first need a value. Unreadable or malformed files are errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(store) => Ok(store),
            Err(SynonymError::ConfigMissing { path }) => {
                warn!(path = %path.display(), "configuration file not found, using empty configuration");
                Ok(Self {
                    entries: BTreeMap::new(),
                    source: Some(path),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Load a properties file, reporting a missing file as
    /// [`SynonymError::ConfigMissing`].
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SynonymError::ConfigMissing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let entries = properties::parse(&content)?;
        info!(path = %path.display(), keys = entries.len(), "loaded configuration");
        Ok(Self {
            entries,
            source: Some(path.to_path_buf()),
        })
    }

    /// Load `config/jdbc-reload.properties` next to the running executable.
    pub fn from_install_dir() -> Result<Self> {
        Self::load(Self::default_path()?)
    }

    /// Path of the configuration resource relative to the running executable.
    pub fn default_path() -> Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| SynonymError::config("executable has no parent directory"))?;
        Ok(dir.join(CONFIG_DIR).join(DB_PROPERTIES))
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Look up a key that must be present and non-blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(SynonymError::config(format!("missing required key '{key}'"))),
        }
    }

    /// Look up and parse a key, falling back to `default` when absent.
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e| SynonymError::config(format!("invalid value '{raw}' for '{key}': {e}"))),
        }
    }

    /// The file this store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_PROPERTIES);

        let store = ConfigurationStore::load(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("jdbc.url"), None);
        assert_eq!(store.source(), Some(path.as_path()));

        assert!(matches!(
            ConfigurationStore::try_load(&path),
            Err(SynonymError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn test_load_properties_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_PROPERTIES);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "jdbc.url=sqlite://dict.db").unwrap();
        writeln!(file, "jdbc.maxActive=4").unwrap();

        let store = ConfigurationStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("jdbc.url"), Some("sqlite://dict.db"));
        assert_eq!(store.parse_or("jdbc.maxActive", 10usize).unwrap(), 4);
        assert_eq!(store.parse_or("jdbc.minIdle", 2usize).unwrap(), 2);
    }

    #[test]
    fn test_require_rejects_blank() {
        let store = ConfigurationStore::from_pairs([("jdbc.user", "  ")]);
        assert!(store.require("jdbc.user").is_err());
        assert!(store.require("jdbc.url").is_err());
    }

    #[test]
    fn test_parse_or_invalid() {
        let store = ConfigurationStore::from_pairs([("jdbc.maxWait", "soon")]);
        let err = store.parse_or("jdbc.maxWait", 6000u64).unwrap_err();
        assert!(err.to_string().contains("jdbc.maxWait"));
    }
}
