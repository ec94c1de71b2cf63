//! Background polling of a synonym source.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::source::SynonymSource;

/// Result of one check-then-reload cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PollOutcome {
    Unchanged,
    Reloaded { terms: usize },
    Failed { error: String },
}

/// Check the source once and reload it if it changed.
pub fn poll_once(source: &dyn SynonymSource) -> PollOutcome {
    if !source.needs_reload() {
        return PollOutcome::Unchanged;
    }
    match source.reload_synonym_table() {
        Ok(table) => PollOutcome::Reloaded { terms: table.len() },
        Err(e) => PollOutcome::Failed {
            error: e.to_string(),
        },
    }
}

/// Counters kept by a [`ReloadPoller`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollerStats {
    pub cycles: u64,
    pub reloads: u64,
    pub failures: u64,
    pub last_reload: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PollerStats {
    fn record(&mut self, outcome: &PollOutcome) {
        self.cycles += 1;
        match outcome {
            PollOutcome::Unchanged => {}
            PollOutcome::Reloaded { .. } => {
                self.reloads += 1;
                self.last_reload = Some(Utc::now());
            }
            PollOutcome::Failed { error } => {
                self.failures += 1;
                self.last_error = Some(error.clone());
            }
        }
    }
}

/// One thread polling one source at a fixed interval.
///
/// The first cycle runs immediately. Cycles never overlap, so a source
/// driven only by its poller sees its reloads strictly in sequence.
pub struct ReloadPoller {
    stop_tx: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
    stats: Arc<RwLock<PollerStats>>,
    interval: Duration,
}

impl ReloadPoller {
    pub fn spawn<S>(source: Arc<S>, interval: Duration) -> Result<Self>
    where
        S: SynonymSource + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let stats = Arc::new(RwLock::new(PollerStats::default()));
        let worker_stats = Arc::clone(&stats);

        let worker = thread::Builder::new()
            .name("synonym-poller".to_string())
            .spawn(move || {
                loop {
                    let outcome = poll_once(source.as_ref());
                    match &outcome {
                        PollOutcome::Unchanged => debug!("poll cycle: unchanged"),
                        PollOutcome::Reloaded { terms } => info!(terms, "poll cycle: reloaded"),
                        PollOutcome::Failed { error } => warn!(%error, "poll cycle: reload failed"),
                    }
                    worker_stats.write().record(&outcome);

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("synonym poller stopped");
            })?;

        info!(interval_secs = interval.as_secs_f64(), "synonym poller started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            stats,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> PollerStats {
        self.stats.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Signal the thread and wait for the running cycle to finish.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("synonym poller thread panicked");
            }
        }
    }
}

impl Drop for ReloadPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynonymError;
    use crate::fetcher::RawDictionaryText;
    use crate::source::SynonymTableHandle;
    use crate::synonym::table::SynonymTable;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    /// Reports a change on every other check; every third reload fails.
    struct Flapping {
        checks: AtomicU64,
        reloads: AtomicU64,
        handle: SynonymTableHandle,
    }

    impl SynonymSource for Flapping {
        fn needs_reload(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst) % 2 == 0
        }

        fn reload_synonym_table(&self) -> Result<Arc<SynonymTable>> {
            let n = self.reloads.fetch_add(1, Ordering::SeqCst);
            if n % 3 == 2 {
                Err(SynonymError::connection("flap"))
            } else {
                Ok(self.handle.current())
            }
        }

        fn raw_text(&self) -> Result<RawDictionaryText> {
            Ok(RawDictionaryText::new())
        }

        fn handle(&self) -> SynonymTableHandle {
            self.handle.clone()
        }
    }

    #[test]
    fn test_poll_once_outcomes() {
        let source = Flapping {
            checks: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            handle: SynonymTableHandle::new(),
        };
        assert_eq!(poll_once(&source), PollOutcome::Reloaded { terms: 0 });
        assert_eq!(poll_once(&source), PollOutcome::Unchanged);
    }

    #[test]
    fn test_poller_counts_and_stops() {
        let source = Arc::new(Flapping {
            checks: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            handle: SynonymTableHandle::new(),
        });
        let mut poller = ReloadPoller::spawn(Arc::clone(&source), Duration::from_millis(5)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while poller.stats().cycles < 12 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        poller.stop();
        assert!(!poller.is_running());

        let stats = poller.stats();
        assert!(stats.cycles >= 12);
        assert!(stats.reloads >= 1);
        assert!(stats.failures >= 1);
        assert_eq!(stats.last_error.as_deref(), Some("Connection error: flap"));

        let cycles = stats.cycles;
        thread::sleep(Duration::from_millis(30));
        assert_eq!(poller.stats().cycles, cycles);
    }
}
