//! Compilation of rule text into a [`SynonymTable`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SynonymError};
use crate::fetcher::RawDictionaryText;
use crate::synonym::solr::{self, SolrRule};
use crate::synonym::table::{SynonymTable, SynonymTableBuilder};
use crate::synonym::wordnet;

/// Turns rule text into a compiled table.
///
/// Implementations must be all-or-nothing: either a complete table or an
/// error, never a partially applied rule set.
pub trait SynonymCompiler: Send + Sync {
    fn compile(&self, text: &RawDictionaryText) -> Result<SynonymTable>;
}

/// Rule line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynonymFormat {
    #[default]
    Solr,
    Wordnet,
}

impl FromStr for SynonymFormat {
    type Err = SynonymError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "solr" => Ok(SynonymFormat::Solr),
            "wordnet" => Ok(SynonymFormat::Wordnet),
            other => Err(SynonymError::config(format!(
                "unknown synonym format '{other}' (expected 'solr' or 'wordnet')"
            ))),
        }
    }
}

impl fmt::Display for SynonymFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynonymFormat::Solr => write!(f, "solr"),
            SynonymFormat::Wordnet => write!(f, "wordnet"),
        }
    }
}

/// Options for [`RuleCompiler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub format: SynonymFormat,

    /// Equivalence groups map every term to every other term; when false
    /// they map every term to the first one.
    pub expand: bool,

    /// Log and skip malformed lines instead of failing the whole compile.
    pub lenient: bool,

    /// Lowercase terms before storing them.
    pub ignore_case: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            format: SynonymFormat::Solr,
            expand: true,
            lenient: false,
            ignore_case: false,
        }
    }
}

impl CompilerOptions {
    pub fn with_format(mut self, format: SynonymFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}

/// Default compiler for the Solr and WordNet line formats.
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    options: CompilerOptions,
}

impl RuleCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile a string directly.
    pub fn compile_str(&self, text: &str) -> Result<SynonymTable> {
        self.compile(&RawDictionaryText::from(text))
    }

    fn compile_solr(&self, text: &RawDictionaryText) -> Result<SynonymTableBuilder> {
        let mut builder = SynonymTableBuilder::new();

        for (index, line) in text.lines().enumerate() {
            match solr::parse_line(line, self.options.ignore_case) {
                Ok(None) => {}
                Ok(Some(SolrRule::Group(terms))) => builder.add_group(&terms, self.options.expand),
                Ok(Some(SolrRule::Mapping { from, to })) => {
                    for source in &from {
                        for target in &to {
                            builder.add_mapping(source, target);
                        }
                    }
                }
                Err(message) => self.reject(index + 1, line, message)?,
            }
        }

        Ok(builder)
    }

    fn compile_wordnet(&self, text: &RawDictionaryText) -> Result<SynonymTableBuilder> {
        let mut builder = SynonymTableBuilder::new();
        let mut synset: Option<String> = None;
        let mut group: Vec<String> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let entry = match wordnet::parse_line(line) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(message) => {
                    self.reject(index + 1, line, message)?;
                    continue;
                }
            };

            if synset.as_deref() != Some(entry.synset.as_str()) {
                builder.add_group(&group, self.options.expand);
                group.clear();
                synset = Some(entry.synset);
            }
            let word = if self.options.ignore_case {
                entry.word.to_lowercase()
            } else {
                entry.word
            };
            group.push(word);
        }
        builder.add_group(&group, self.options.expand);

        Ok(builder)
    }

    fn reject(&self, line_number: usize, line: &str, message: String) -> Result<()> {
        if self.options.lenient {
            warn!(line = line_number, rule = %line.trim(), %message, "skipping malformed synonym rule");
            Ok(())
        } else {
            Err(SynonymError::compile(line_number, format!("{message}: '{}'", line.trim())))
        }
    }
}

impl SynonymCompiler for RuleCompiler {
    fn compile(&self, text: &RawDictionaryText) -> Result<SynonymTable> {
        let builder = match self.options.format {
            SynonymFormat::Solr => self.compile_solr(text)?,
            SynonymFormat::Wordnet => self.compile_wordnet(text)?,
        };
        let table = builder.build()?;
        info!(
            format = %self.options.format,
            lines = text.entry_count(),
            terms = table.len(),
            "compiled synonym table"
        );
        Ok(table)
    }
}
