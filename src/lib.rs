//! # dynamic-synonym
//!
//! A hot-reloadable synonym dictionary for search analyzers. Rules live in
//! a relational store (or a plain file); the library polls the store for a
//! last-modified marker, and when it moves forward fetches the rules,
//! compiles them into an FST-backed table and swaps it in atomically.
//!
//! ## Features
//!
//! - Properties-file configuration with typed views
//! - Bounded, blocking connection pool with retry and a circuit breaker
//! - Strictly monotone change detection
//! - Solr and WordNet rule formats
//! - Lock-free reader snapshots across reloads
//! - Background poller and a CLI

pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod fetcher;
pub mod poller;
pub mod pool;
pub mod source;
pub mod store;
pub mod synonym;
pub mod version;

pub mod prelude {
    pub use crate::config::{ConfigurationStore, JdbcSettings, PoolConfig, ReloadConfig};
    pub use crate::error::{Result, SynonymError};
    pub use crate::fetcher::RawDictionaryText;
    pub use crate::poller::{PollOutcome, ReloadPoller};
    pub use crate::pool::ConnectionPool;
    pub use crate::source::{
        DatabaseSynonymSource, FileSynonymSource, SourceKind, SynonymSource, SynonymTableHandle,
    };
    pub use crate::synonym::{CompilerOptions, RuleCompiler, SynonymCompiler, SynonymTable};
    pub use crate::version::{DictionaryVersion, VersionLookup};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
