//! Synonym rules and the compiled table built from them.
//!
//! Synonyms allow matching semantically equivalent terms (e.g. "quick" and
//! "fast") to improve search recall. Rule text is compiled into an immutable
//! [`SynonymTable`] that the analyzer reads at tokenization time.
//!
//! # Components
//!
//! - [`compiler`] - the [`SynonymCompiler`] seam and the default [`RuleCompiler`]
//! - [`solr`] - the `a,b,c` / `a,b => c` line format
//! - [`wordnet`] - the WordNet `s(...)` prolog format
//! - [`table`] - the FST-backed compiled table
//!
//! # Examples
//!
//! ```
//! use dynamic_synonym::synonym::RuleCompiler;
//!
//! let table = RuleCompiler::default()
//!     .compile_str("quick, fast, rapid\nbig, large, huge\n")
//!     .unwrap();
//!
//! assert!(table.get_synonyms("quick").is_some());
//! assert!(table.maps_to("big", "huge"));
//! ```

pub mod compiler;
pub mod solr;
pub mod table;
pub mod wordnet;

pub use compiler::{CompilerOptions, RuleCompiler, SynonymCompiler, SynonymFormat};
pub use table::{SynonymTable, SynonymTableBuilder};
