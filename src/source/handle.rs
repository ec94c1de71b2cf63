//! Shared reference to the currently published synonym table.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::synonym::table::SynonymTable;

/// Cloneable reader handle.
///
/// Readers take an `Arc` snapshot with [`current`](Self::current) and keep
/// using it for as long as they like; a publish replaces the shared pointer
/// but never touches a table a reader already holds.
#[derive(Debug, Clone)]
pub struct SynonymTableHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    table: RwLock<Arc<SynonymTable>>,
    /// Number of successful publishes; zero means nothing was loaded yet.
    generation: AtomicU64,
}

impl SynonymTableHandle {
    /// A handle serving an empty table until the first publish.
    pub fn new() -> Self {
        Self::with_table(SynonymTable::empty())
    }

    pub fn with_table(table: SynonymTable) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                table: RwLock::new(Arc::new(table)),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the published table.
    pub fn current(&self) -> Arc<SynonymTable> {
        Arc::clone(&self.inner.table.read())
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    /// Replace the published table in one pointer swap.
    pub(crate) fn publish(&self, table: SynonymTable) -> Arc<SynonymTable> {
        let table = Arc::new(table);
        {
            let mut guard = self.inner.table.write();
            *guard = Arc::clone(&table);
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
        }
        table
    }
}

impl Default for SynonymTableHandle {
    fn default() -> Self {
        Self::new()
    }
}
