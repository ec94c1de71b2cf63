//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{DynamicSynonymArgs, OutputFormat};
use crate::error::Result;
use crate::poller::PollOutcome;

/// Result structure for an update check.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResult {
    pub source: String,
    pub changed: bool,
    pub version: Option<String>,
}

/// One term and its synonyms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub term: String,
    pub synonyms: Vec<String>,
}

/// Result structure for a reload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResult {
    pub source: String,
    pub version: Option<String>,
    pub terms: usize,
    pub max_phrase_length: usize,
    pub fst_bytes: usize,
    pub duration_ms: u64,
    pub lookups: Vec<LookupResult>,
}

/// Raw rule lines.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawDumpResult {
    pub source: String,
    pub lines: Vec<String>,
}

/// Compiled term mappings.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompiledDumpResult {
    pub source: String,
    pub entries: Vec<LookupResult>,
}

/// One watch cycle.
#[derive(Debug, Serialize, Deserialize)]
pub struct WatchCycleResult {
    pub cycle: u64,
    #[serde(flatten)]
    pub outcome: PollOutcome,
    pub version: Option<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(
    message: &str,
    result: &T,
    args: &DynamicSynonymArgs,
) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &DynamicSynonymArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    if let Some(obj) = value.as_object() {
        for (key, val) in obj {
            match (key.as_str(), val) {
                ("lookups" | "entries", serde_json::Value::Array(items)) => {
                    for item in items {
                        println!("{}", format_lookup(item));
                    }
                }
                ("lines", serde_json::Value::Array(lines)) => {
                    for line in lines {
                        println!("{}", format_value(line));
                    }
                }
                _ => println!("{key}: {}", format_value(val)),
            }
        }
    } else {
        println!("{}", format_value(&value));
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &DynamicSynonymArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// `term => a, b` for a serialized [`LookupResult`].
fn format_lookup(value: &serde_json::Value) -> String {
    let term = value.get("term").map(format_value).unwrap_or_default();
    match value.get("synonyms").and_then(|s| s.as_array()) {
        Some(synonyms) if !synonyms.is_empty() => {
            let joined = synonyms.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("{term} => {joined}")
        }
        _ => format!("{term} => (none)"),
    }
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(
            format_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(
            format_value(&serde_json::Value::Number(serde_json::Number::from(42))),
            "42"
        );
        assert_eq!(format_value(&serde_json::Value::Bool(false)), "false");
        assert_eq!(format_value(&serde_json::Value::Null), "-");
    }

    #[test]
    fn test_format_lookup() {
        let hit = serde_json::to_value(LookupResult {
            term: "fast".to_string(),
            synonyms: vec!["quick".to_string(), "rapid".to_string()],
        })
        .unwrap();
        assert_eq!(format_lookup(&hit), "fast => quick, rapid");

        let miss = serde_json::to_value(LookupResult {
            term: "slow".to_string(),
            synonyms: Vec::new(),
        })
        .unwrap();
        assert_eq!(format_lookup(&miss), "slow => (none)");
    }

    #[test]
    fn test_watch_cycle_serializes_flat() {
        let value = serde_json::to_value(WatchCycleResult {
            cycle: 2,
            outcome: PollOutcome::Reloaded { terms: 4 },
            version: None,
        })
        .unwrap();
        assert_eq!(value["outcome"], "reloaded");
        assert_eq!(value["terms"], 4);
        assert_eq!(value["cycle"], 2);
    }
}
