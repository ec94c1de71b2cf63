//! Compiled synonym table.
//!
//! Uses FST (Finite State Transducer) for memory-efficient storage and fast lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use fst::{Map, MapBuilder, Streamer};

use crate::error::{Result, SynonymError};

/// Immutable term → synonyms table consumed by the analyzer.
///
/// Maps terms to their synonyms using an FST keyed by term with values
/// indexing into the synonym lists. Cloning is cheap: both halves are shared.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    /// FST map: term -> index into synonym_lists
    fst_map: Arc<Map<Arc<[u8]>>>,
    /// Synonym lists indexed by FST values
    synonym_lists: Arc<Vec<Vec<String>>>,
    /// Maximum number of tokens to look ahead for multi-word synonym matching
    max_phrase_length: usize,
}

impl SynonymTable {
    /// A table with no entries.
    pub fn empty() -> Self {
        SynonymTableBuilder::new()
            .build()
            .expect("an empty FST is always valid")
    }

    /// Synonyms for a term or space-separated phrase.
    pub fn get_synonyms(&self, term: &str) -> Option<&[String]> {
        let index = self.fst_map.get(term.as_bytes())? as usize;
        self.synonym_lists.get(index).map(Vec::as_slice)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.fst_map.contains_key(term.as_bytes())
    }

    /// Whether `a` lists `b` as a synonym.
    pub fn maps_to(&self, a: &str, b: &str) -> bool {
        self.get_synonyms(a)
            .is_some_and(|synonyms| synonyms.iter().any(|s| s == b))
    }

    /// Number of terms with synonyms.
    pub fn len(&self) -> usize {
        self.fst_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fst_map.is_empty()
    }

    /// Get the maximum phrase length in the table.
    pub fn max_phrase_length(&self) -> usize {
        self.max_phrase_length
    }

    /// All terms in lexicographic byte order.
    pub fn terms(&self) -> Vec<String> {
        let mut terms = Vec::with_capacity(self.len());
        let mut stream = self.fst_map.stream();
        while let Some((key, _)) = stream.next() {
            terms.push(String::from_utf8_lossy(key).into_owned());
        }
        terms
    }

    /// Serialized FST bytes.
    pub fn fst_bytes(&self) -> &[u8] {
        self.fst_map.as_fst().as_bytes()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for SynonymTable {
    fn eq(&self, other: &Self) -> bool {
        self.fst_bytes() == other.fst_bytes()
            && self.synonym_lists == other.synonym_lists
            && self.max_phrase_length == other.max_phrase_length
    }
}

impl Eq for SynonymTable {}

/// Accumulates term mappings, then freezes them into a [`SynonymTable`].
#[derive(Debug, Default)]
pub struct SynonymTableBuilder {
    mappings: BTreeMap<String, Vec<String>>,
}

impl SynonymTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `from` to `to`. Repeated targets are kept once, in first-seen order.
    pub fn add_mapping(&mut self, from: &str, to: &str) {
        let targets = self.mappings.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
    }

    /// Add an equivalence group.
    ///
    /// With `expand`, every term maps to every other term: adding
    /// `["big", "large", "huge"]` creates
    /// - "big" -> ["large", "huge"]
    /// - "large" -> ["big", "huge"]
    /// - "huge" -> ["big", "large"]
    ///
    /// Without it, every term maps to the first one.
    pub fn add_group(&mut self, terms: &[String], expand: bool) {
        if terms.len() < 2 {
            return;
        }
        if expand {
            for (i, term) in terms.iter().enumerate() {
                for (j, other) in terms.iter().enumerate() {
                    if i != j && term != other {
                        self.add_mapping(term, other);
                    }
                }
            }
        } else {
            let canonical = &terms[0];
            for term in terms {
                self.add_mapping(term, canonical);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Build the FST. Keys are already sorted by the `BTreeMap`, so the same
    /// mappings always produce byte-identical tables.
    pub fn build(self) -> Result<SynonymTable> {
        let mut max_phrase_length = 1;
        let mut synonym_lists = Vec::with_capacity(self.mappings.len());
        let mut builder = MapBuilder::memory();

        for (term, synonyms) in self.mappings {
            max_phrase_length = max_phrase_length
                .max(phrase_length(&term))
                .max(synonyms.iter().map(|s| phrase_length(s)).max().unwrap_or(1));

            let index = synonym_lists.len() as u64;
            builder
                .insert(term.as_bytes(), index)
                .map_err(|e| SynonymError::other(format!("FST build error: {e}")))?;
            synonym_lists.push(synonyms);
        }

        let fst_bytes = builder
            .into_inner()
            .map_err(|e| SynonymError::other(format!("FST finalize error: {e}")))?;
        let fst_map = Map::new(Arc::from(fst_bytes))
            .map_err(|e| SynonymError::other(format!("FST creation error: {e}")))?;

        Ok(SynonymTable {
            fst_map: Arc::new(fst_map),
            synonym_lists: Arc::new(synonym_lists),
            max_phrase_length,
        })
    }
}

/// Tokens an analyzer needs to look ahead to match `term`.
///
/// Whitespace-separated words count one each; an unspaced non-ASCII term
/// (CJK text) longer than three characters is assumed to split into
/// two-character tokens.
fn phrase_length(term: &str) -> usize {
    let word_count = term.split_whitespace().count();
    if word_count == 1 {
        let has_ascii = term.chars().any(|c| c.is_ascii_alphanumeric());
        let char_count = term.chars().count();
        if !has_ascii && char_count > 3 {
            char_count.div_ceil(2)
        } else {
            1
        }
    } else {
        word_count.max(1)
    }
}
