//! Version tracking and atomic publication shared by every source.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::fetcher::RawDictionaryText;
use crate::source::handle::SynonymTableHandle;
use crate::synonym::compiler::SynonymCompiler;
use crate::synonym::table::SynonymTable;
use crate::version::{DictionaryVersion, VersionLookup};

/// Where a source reads its version and its rule text from.
pub trait DictionaryBackend: Send + Sync {
    /// Current version of the stored dictionary.
    fn latest_version(&self) -> Result<VersionLookup>;

    /// Full rule text. Any resource taken for the fetch is released before
    /// this returns, on success and on failure.
    fn fetch(&self) -> Result<RawDictionaryText>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Lifecycle of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    /// Nothing published yet; readers see an empty table.
    Unloaded,
    Loaded,
}

#[derive(Debug, Default, Clone, Copy)]
struct Versions {
    /// Newest version observed by an update check.
    held: Option<DictionaryVersion>,
    /// Version the published table was built from.
    loaded: Option<DictionaryVersion>,
}

/// A dictionary that can be polled for changes and reloaded in place.
///
/// `check_for_update` and `reload` may be called from any thread. Reloads
/// run one at a time; a caller that queued behind a running reload which
/// already covered the version it saw gets that reload's table back.
pub struct ReloadableSource<B> {
    backend: B,
    compiler: Arc<dyn SynonymCompiler>,
    handle: SynonymTableHandle,
    versions: Mutex<Versions>,
    reload_gate: Mutex<()>,
}

impl<B: DictionaryBackend> ReloadableSource<B> {
    pub fn new(backend: B, compiler: Arc<dyn SynonymCompiler>) -> Self {
        Self {
            backend,
            compiler,
            handle: SynonymTableHandle::new(),
            versions: Mutex::new(Versions::default()),
            reload_gate: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle(&self) -> SynonymTableHandle {
        self.handle.clone()
    }

    /// Snapshot of the published table.
    pub fn current(&self) -> Arc<SynonymTable> {
        self.handle.current()
    }

    pub fn state(&self) -> SourceState {
        if self.handle.generation() == 0 {
            SourceState::Unloaded
        } else {
            SourceState::Loaded
        }
    }

    /// Newest version seen by an update check or a reload.
    pub fn held_version(&self) -> Option<DictionaryVersion> {
        self.versions.lock().held
    }

    /// Version the published table was compiled from.
    pub fn loaded_version(&self) -> Option<DictionaryVersion> {
        self.versions.lock().loaded
    }

    /// Ask the backend for its version and report whether it is strictly
    /// newer than the one held. Never fails: lookups that cannot answer
    /// are logged and reported as "no change".
    pub fn check_for_update(&self) -> bool {
        match self.backend.latest_version() {
            Ok(VersionLookup::Found(latest)) => {
                let mut versions = self.versions.lock();
                if latest.is_newer_than(versions.held) {
                    info!(
                        source = %self.backend.describe(),
                        version = %latest,
                        previous = ?versions.held.map(|v| v.to_string()),
                        "synonym dictionary changed"
                    );
                    versions.held = Some(latest);
                    true
                } else {
                    debug!(source = %self.backend.describe(), version = %latest, "synonym dictionary unchanged");
                    false
                }
            }
            Ok(VersionLookup::NotFound) => {
                warn!(source = %self.backend.describe(), "no modification time available, skipping reload");
                false
            }
            Err(e) => {
                error!(source = %self.backend.describe(), error = %e, "update check failed");
                false
            }
        }
    }

    /// Fetch, compile and publish the dictionary.
    ///
    /// On failure the published table is left as it was and the held
    /// version falls back to the loaded one, so the next check reports the
    /// change again.
    pub fn reload(&self) -> Result<Arc<SynonymTable>> {
        let wanted = self.versions.lock().held;
        let seen_generation = self.handle.generation();

        let _gate = self.reload_gate.lock();

        if self.handle.generation() != seen_generation {
            let loaded = self.versions.lock().loaded;
            if wanted.is_none_or(|v| !v.is_newer_than(loaded)) {
                debug!(source = %self.backend.describe(), "joined a concurrent reload");
                return Ok(self.handle.current());
            }
        }

        let target = self.observe_version().or(wanted);

        match self.build() {
            Ok(table) => {
                let terms = table.len();
                let published = self.handle.publish(table);
                let mut versions = self.versions.lock();
                versions.loaded = target;
                if target.is_some_and(|v| v.is_newer_than(versions.held)) {
                    versions.held = target;
                }
                info!(
                    source = %self.backend.describe(),
                    version = ?target.map(|v| v.to_string()),
                    terms,
                    generation = self.handle.generation(),
                    "synonym table published"
                );
                Ok(published)
            }
            Err(e) => {
                let mut versions = self.versions.lock();
                versions.held = versions.loaded;
                error!(
                    source = %self.backend.describe(),
                    error = %e,
                    "synonym reload failed, keeping previous table"
                );
                Err(e)
            }
        }
    }

    /// Fresh copy of the stored rule text, independent of the published table.
    pub fn raw_text(&self) -> Result<RawDictionaryText> {
        self.backend.fetch()
    }

    fn build(&self) -> Result<SynonymTable> {
        let text = self.backend.fetch()?;
        self.compiler.compile(&text)
    }

    fn observe_version(&self) -> Option<DictionaryVersion> {
        match self.backend.latest_version() {
            Ok(lookup) => lookup.version(),
            Err(e) => {
                debug!(source = %self.backend.describe(), error = %e, "could not read version before reload");
                None
            }
        }
    }
}

impl<B: DictionaryBackend> fmt::Debug for ReloadableSource<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let versions = *self.versions.lock();
        f.debug_struct("ReloadableSource")
            .field("backend", &self.backend.describe())
            .field("held", &versions.held)
            .field("loaded", &versions.loaded)
            .field("generation", &self.handle.generation())
            .finish()
    }
}
