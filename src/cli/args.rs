//! Command line argument parsing for the dynamic-synonym CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// dynamic-synonym - inspect and reload a database-backed synonym dictionary
#[derive(Parser, Debug, Clone)]
#[command(name = "dynamic-synonym")]
#[command(about = "Inspect, reload and watch a hot-reloadable synonym dictionary")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct DynamicSynonymArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Properties file (default: config/jdbc-reload.properties next to the executable)
    #[arg(short, long, value_name = "FILE", env = "DYNAMIC_SYNONYM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl DynamicSynonymArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ask the store whether the dictionary changed
    Check(CheckArgs),

    /// Load and compile the dictionary
    Reload(ReloadArgs),

    /// Print the stored rules or the compiled table
    Dump(DumpArgs),

    /// Poll the store and reload on change
    Watch(WatchArgs),
}

/// Arguments for checking for an update
#[derive(Parser, Debug, Clone, Default)]
pub struct CheckArgs {}

/// Arguments for reloading
#[derive(Parser, Debug, Clone, Default)]
pub struct ReloadArgs {
    /// Terms to look up in the compiled table (repeatable)
    #[arg(short, long = "lookup", value_name = "TERM")]
    pub lookups: Vec<String>,
}

/// Arguments for dumping
#[derive(Parser, Debug, Clone, Default)]
pub struct DumpArgs {
    /// Print compiled term mappings instead of raw rule lines
    #[arg(long)]
    pub compiled: bool,
}

/// Arguments for watching
#[derive(Parser, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Seconds between checks (default: synonym.interval)
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Stop after this many cycles (default: run until killed)
    #[arg(short = 'n', long, value_name = "N")]
    pub cycles: Option<u64>,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_command() {
        let args = DynamicSynonymArgs::try_parse_from([
            "dynamic-synonym",
            "--config",
            "/etc/jdbc-reload.properties",
            "reload",
            "--lookup",
            "fast",
            "-l",
            "car",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/jdbc-reload.properties")));
        if let Command::Reload(reload_args) = args.command {
            assert_eq!(reload_args.lookups, vec!["fast", "car"]);
        } else {
            panic!("Expected Reload command");
        }
    }

    #[test]
    fn test_watch_command() {
        let args = DynamicSynonymArgs::try_parse_from([
            "dynamic-synonym",
            "watch",
            "--interval",
            "5",
            "--cycles",
            "3",
        ])
        .unwrap();

        if let Command::Watch(watch_args) = args.command {
            assert_eq!(watch_args.interval, Some(5));
            assert_eq!(watch_args.cycles, Some(3));
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = DynamicSynonymArgs::try_parse_from(["dynamic-synonym", "check"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = DynamicSynonymArgs::try_parse_from(["dynamic-synonym", "-vv", "check"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = DynamicSynonymArgs::try_parse_from(["dynamic-synonym", "-vvv", "-q", "check"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = DynamicSynonymArgs::try_parse_from([
            "dynamic-synonym",
            "--format",
            "json",
            "--pretty",
            "dump",
            "--compiled",
        ])
        .unwrap();
        assert!(matches!(args.output_format, OutputFormat::Json));
        assert!(args.pretty);
        assert!(matches!(args.command, Command::Dump(DumpArgs { compiled: true })));
    }
}
