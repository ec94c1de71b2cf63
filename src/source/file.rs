//! Dictionary stored as a plain file, versioned by its modification time.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use crate::config::ReloadConfig;
use crate::error::{Result, SynonymError};
use crate::fetcher::RawDictionaryText;
use crate::source::reloadable::{DictionaryBackend, ReloadableSource};
use crate::synonym::compiler::{RuleCompiler, SynonymCompiler};
use crate::version::{DictionaryVersion, VersionLookup};

/// Reload machine over a rules file.
pub type FileSynonymSource = ReloadableSource<FileBackend>;

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DictionaryBackend for FileBackend {
    /// A missing file has no version rather than failing the check.
    fn latest_version(&self) -> Result<VersionLookup> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(VersionLookup::NotFound),
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified()?;
        let millis = modified
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SynonymError::other(format!("modification time before epoch: {e}")))?
            .as_millis();
        let millis = i64::try_from(millis)
            .map_err(|_| SynonymError::other("modification time out of range"))?;
        Ok(VersionLookup::Found(DictionaryVersion::from_millis(millis)))
    }

    fn fetch(&self) -> Result<RawDictionaryText> {
        Ok(RawDictionaryText::from(fs::read_to_string(&self.path)?))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

impl ReloadableSource<FileBackend> {
    pub fn from_path<P: Into<PathBuf>>(path: P, reload: &ReloadConfig) -> Self {
        let compiler: Arc<dyn SynonymCompiler> = Arc::new(RuleCompiler::new(reload.compiler.clone()));
        Self::new(FileBackend::new(path), compiler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.txt"));
        assert_eq!(backend.latest_version().unwrap(), VersionLookup::NotFound);
        assert!(matches!(backend.fetch(), Err(SynonymError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("synonyms.txt");
        fs::write(&path, "fast,quick\n# comment\ncar,automobile\n").unwrap();

        let source = FileSynonymSource::from_path(&path, &ReloadConfig::default());
        assert!(source.check_for_update());
        let table = source.reload().unwrap();
        assert!(table.maps_to("quick", "fast"));
        assert!(table.maps_to("automobile", "car"));
        assert!(!source.check_for_update());
    }
}
