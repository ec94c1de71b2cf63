//! Command implementations for the dynamic-synonym CLI.

use std::io::Read;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{ConfigurationStore, ReloadConfig};
use crate::error::Result;
use crate::poller::poll_once;
use crate::source::{SourceKind, SynonymSource};
use crate::synonym::table::SynonymTable;

/// Execute a CLI command.
pub fn execute_command(args: DynamicSynonymArgs) -> Result<()> {
    match &args.command {
        Command::Check(_) => check(&args),
        Command::Reload(reload_args) => reload(reload_args.clone(), &args),
        Command::Dump(dump_args) => dump(dump_args.clone(), &args),
        Command::Watch(watch_args) => watch(watch_args.clone(), &args),
    }
}

/// Load configuration and build the source it describes.
fn open_source(cli_args: &DynamicSynonymArgs) -> Result<(SourceKind, ReloadConfig)> {
    let store = match &cli_args.config {
        Some(path) => ConfigurationStore::try_load(path)?,
        None => ConfigurationStore::from_install_dir()?,
    };
    debug!(source = ?store.source(), keys = store.len(), "configuration loaded");

    let reload = ReloadConfig::from_store(&store)?;
    let source = SourceKind::from_config(&store, &reload)?;
    Ok((source, reload))
}

fn lookup(table: &SynonymTable, term: &str) -> LookupResult {
    LookupResult {
        term: term.to_string(),
        synonyms: table.get_synonyms(term).map(<[String]>::to_vec).unwrap_or_default(),
    }
}

/// Ask the store for its current version.
fn check(cli_args: &DynamicSynonymArgs) -> Result<()> {
    let (source, _) = open_source(cli_args)?;
    let changed = source.check_for_update();

    output_result(
        "Update check finished",
        &CheckResult {
            source: source.describe(),
            changed,
            version: source.held_version().map(|v| v.to_string()),
        },
        cli_args,
    )
}

/// Load, compile and report on the dictionary.
fn reload(args: ReloadArgs, cli_args: &DynamicSynonymArgs) -> Result<()> {
    let (source, _) = open_source(cli_args)?;

    let start_time = Instant::now();
    let table = source.reload()?;
    let duration = start_time.elapsed();

    output_result(
        "Synonym table reloaded",
        &ReloadResult {
            source: source.describe(),
            version: source.loaded_version().map(|v| v.to_string()),
            terms: table.len(),
            max_phrase_length: table.max_phrase_length(),
            fst_bytes: table.fst_bytes().len(),
            duration_ms: duration.as_millis() as u64,
            lookups: args.lookups.iter().map(|term| lookup(&table, term)).collect(),
        },
        cli_args,
    )
}

/// Print the stored rules, or the compiled table with `--compiled`.
fn dump(args: DumpArgs, cli_args: &DynamicSynonymArgs) -> Result<()> {
    let (source, _) = open_source(cli_args)?;

    if args.compiled {
        let table = source.reload()?;
        let entries = table.terms().iter().map(|term| lookup(&table, term)).collect();
        return output_result(
            "Compiled synonym table",
            &CompiledDumpResult {
                source: source.describe(),
                entries,
            },
            cli_args,
        );
    }

    let mut text = String::new();
    source.reader()?.read_to_string(&mut text)?;
    output_result(
        "Stored synonym rules",
        &RawDumpResult {
            source: source.describe(),
            lines: text.lines().map(str::to_string).collect(),
        },
        cli_args,
    )
}

/// Poll the store, reloading whenever it reports a newer version.
fn watch(args: WatchArgs, cli_args: &DynamicSynonymArgs) -> Result<()> {
    let (source, reload) = open_source(cli_args)?;
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or(reload.interval);

    if cli_args.verbosity() > 1 {
        println!(
            "Watching {} every {}s",
            source.describe(),
            interval.as_secs_f64()
        );
    }

    let mut cycle = 0;
    loop {
        cycle += 1;
        let outcome = poll_once(&source);
        output_result(
            "Poll cycle",
            &WatchCycleResult {
                cycle,
                outcome,
                version: source.loaded_version().map(|v| v.to_string()),
            },
            cli_args,
        )?;

        if args.cycles.is_some_and(|limit| cycle >= limit) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}
