//! Configuration for the reload pipeline.
//!
//! Settings are read once from a Java-style properties resource
//! (`config/jdbc-reload.properties` next to the executable by default) into a
//! [`ConfigurationStore`], then viewed through typed structs:
//!
//! - [`JdbcSettings`] - connection parameters and the two polling statements
//! - [`PoolConfig`] - connection pool sizing and retry policy
//! - [`ReloadConfig`] - poll interval, rule format and source location
//!
//! # Examples
//!
//! ```
//! use dynamic_synonym::config::{ConfigurationStore, JdbcSettings};
//!
//! let store = ConfigurationStore::from_pairs([
//!     ("jdbc.url", "sqlite://synonyms.db"),
//!     ("jdbc.driver", "sqlite"),
//!     ("jdbc.lastModified.synonym.sql", "SELECT MAX(updated_at) AS last_modify_dt FROM synonyms"),
//!     ("jdbc.reload.synonym.sql", "SELECT words AS word FROM synonyms ORDER BY id"),
//! ]);
//!
//! let jdbc = JdbcSettings::from_store(&store).unwrap();
//! assert_eq!(jdbc.driver, "sqlite");
//! ```

pub mod properties;
pub mod settings;
pub mod store;

pub use settings::{JdbcSettings, PoolConfig, ReloadConfig};
pub use store::ConfigurationStore;
