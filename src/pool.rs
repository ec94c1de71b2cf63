//! Bounded, blocking connection pool.
//!
//! - At most `max_active` connections exist at once (idle plus leased)
//! - `acquire` blocks up to `max_wait`, then fails with `PoolExhausted`
//! - Opening a connection is retried `connection_error_retry_attempts` times;
//!   when every attempt fails and `break_after_acquire_failure` is set the
//!   pool stops dialing the store for a while and fails fast instead
//! - Leases are returned when the [`PooledConnection`] is dropped, so every
//!   exit path releases exactly once
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dynamic_synonym::config::{ConfigurationStore, JdbcSettings, PoolConfig};
//! use dynamic_synonym::pool::ConnectionPool;
//! use dynamic_synonym::store::Driver;
//!
//! let store = ConfigurationStore::from_install_dir().unwrap();
//! let jdbc = JdbcSettings::from_store(&store).unwrap();
//! let driver: Driver = jdbc.driver.parse().unwrap();
//! let pool = ConnectionPool::new(PoolConfig::from_store(&store).unwrap(), jdbc, driver.factory()).unwrap();
//!
//! let mut conn = pool.acquire().unwrap();
//! let rows = conn.query("SELECT 1").unwrap();
//! // the lease goes back to the pool here
//! drop(conn);
//! # let _ = rows;
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{JdbcSettings, PoolConfig};
use crate::error::{Result, SynonymError};
use crate::store::connection::{Connection, ConnectionFactory};

/// Pool statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total number of connections opened
    pub connections_created: u64,
    /// Total number of connections closed
    pub connections_closed: u64,
    /// Total number of successful acquisitions
    pub acquisitions: u64,
    /// Number of acquisitions that timed out
    pub exhausted_count: u64,
    /// Number of failed connect attempts
    pub connect_failures: u64,
    /// Number of idle connections rejected by validation
    pub validation_failures: u64,
    /// Total time spent waiting in `acquire` (milliseconds)
    pub total_wait_time_ms: u64,
}

/// Lock-free counters behind [`PoolStats`].
#[derive(Debug, Default)]
pub struct AtomicPoolStats {
    connections_created: AtomicU64,
    connections_closed: AtomicU64,
    acquisitions: AtomicU64,
    exhausted_count: AtomicU64,
    connect_failures: AtomicU64,
    validation_failures: AtomicU64,
    total_wait_time_ms: AtomicU64,
}

impl AtomicPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.connections_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquisition(&self, wait_time_ms: u64) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_ms
            .fetch_add(wait_time_ms, Ordering::Relaxed);
    }

    pub fn record_exhausted(&self) {
        self.exhausted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            connections_created: self.connections_created.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            exhausted_count: self.exhausted_count.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            total_wait_time_ms: self.total_wait_time_ms.load(Ordering::Relaxed),
        }
    }
}

struct PoolEntry {
    conn: Box<dyn Connection>,
    last_used: Instant,
}

struct PoolState {
    idle: Vec<PoolEntry>,
    /// Handed out, or reserved while a new connection is being opened.
    leased: usize,
    /// Set after a failed retry cycle; no new connections are dialed until then.
    broken_until: Option<Instant>,
    closed: bool,
}

impl PoolState {
    fn total(&self) -> usize {
        self.leased + self.idle.len()
    }
}

/// A thread-safe pool of store connections.
pub struct ConnectionPool {
    config: PoolConfig,
    settings: JdbcSettings,
    factory: Arc<dyn ConnectionFactory>,
    state: Mutex<PoolState>,
    available: Condvar,
    stats: AtomicPoolStats,
}

impl ConnectionPool {
    /// Create a pool and open `initial_size` connections.
    ///
    /// Failing to open the initial connections is logged, not fatal: the
    /// store may come up later and `acquire` will dial it again.
    pub fn new(
        config: PoolConfig,
        settings: JdbcSettings,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        let pool = Arc::new(Self {
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(config.max_active),
                leased: 0,
                broken_until: None,
                closed: false,
            }),
            available: Condvar::new(),
            stats: AtomicPoolStats::new(),
            config,
            settings,
            factory,
        });

        for _ in 0..pool.config.initial_size {
            match pool.factory.connect(&pool.settings) {
                Ok(conn) => {
                    pool.stats.record_created();
                    pool.state.lock().idle.push(PoolEntry {
                        conn,
                        last_used: Instant::now(),
                    });
                }
                Err(e) => {
                    pool.stats.record_connect_failure();
                    warn!(driver = pool.factory.name(), error = %e, "failed to open initial connection");
                    break;
                }
            }
        }

        info!(
            driver = pool.factory.name(),
            max_active = pool.config.max_active,
            idle = pool.idle_count(),
            "connection pool ready"
        );
        Ok(pool)
    }

    /// Lease a connection, blocking up to `max_wait` for a free slot.
    pub fn acquire(self: &Arc<Self>) -> Result<PooledConnection> {
        let start = Instant::now();
        let deadline = start + self.config.max_wait;

        loop {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SynonymError::pool_exhausted("pool is closed"));
            }

            let evicted = self.evict_idle(&mut state);
            if !evicted.is_empty() {
                drop(state);
                for entry in evicted {
                    self.close_connection(entry.conn);
                }
                continue;
            }

            if let Some(entry) = state.idle.pop() {
                state.leased += 1;
                drop(state);

                let mut conn = entry.conn;
                if self.config.test_on_borrow && !conn.is_valid() {
                    self.stats.record_validation_failure();
                    debug!("discarding idle connection that failed validation");
                    self.close_connection(conn);
                    self.finish_lease();
                    continue;
                }
                return Ok(self.lease(conn, start));
            }

            if state.total() < self.config.max_active {
                // The breaker only stops dialing; idle connections were served above.
                if let Some(until) = state.broken_until {
                    let now = Instant::now();
                    if now < until {
                        return Err(SynonymError::connection(format!(
                            "store unreachable, retrying in {}ms",
                            until.saturating_duration_since(now).as_millis()
                        )));
                    }
                    state.broken_until = None;
                }

                state.leased += 1;
                drop(state);

                return match self.open_with_retry() {
                    Ok(conn) => Ok(self.lease(conn, start)),
                    Err(e) => {
                        self.finish_lease();
                        Err(e)
                    }
                };
            }

            if self.available.wait_until(&mut state, deadline).timed_out() {
                self.stats.record_exhausted();
                warn!(
                    max_active = self.config.max_active,
                    max_wait_ms = self.config.max_wait.as_millis() as u64,
                    "timed out waiting for a pooled connection"
                );
                return Err(SynonymError::pool_exhausted(format!(
                    "no connection available within {}ms ({} of {} leased)",
                    self.config.max_wait.as_millis(),
                    state.leased,
                    self.config.max_active
                )));
            }
        }
    }

    /// Return a lease to the pool. Equivalent to dropping it.
    pub fn release(&self, conn: PooledConnection) {
        drop(conn);
    }

    /// Number of leases currently held by callers.
    pub fn outstanding(&self) -> usize {
        self.state.lock().leased
    }

    /// Number of open idle connections.
    pub fn idle_count(&self) -> usize {
        self.state.lock().idle.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn settings(&self) -> &JdbcSettings {
        &self.settings
    }

    /// Close idle connections and refuse further acquisitions.
    ///
    /// Leases still held are closed as they come back.
    pub fn close(&self) {
        let drained: Vec<PoolEntry> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.idle.drain(..).collect()
        };
        self.available.notify_all();

        for entry in drained {
            self.close_connection(entry.conn);
        }
        info!("connection pool closed");
    }

    fn lease(self: &Arc<Self>, conn: Box<dyn Connection>, start: Instant) -> PooledConnection {
        self.stats
            .record_acquisition(start.elapsed().as_millis() as u64);
        PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            broken: false,
        }
    }

    fn open_with_retry(&self) -> Result<Box<dyn Connection>> {
        let attempts = self.config.connection_error_retry_attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.factory.connect(&self.settings) {
                Ok(conn) => {
                    self.stats.record_created();
                    debug!(attempt, "opened store connection");
                    return Ok(conn);
                }
                Err(e) => {
                    self.stats.record_connect_failure();
                    warn!(attempt, attempts, error = %e, "failed to open store connection");
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(self.config.time_between_connect_error);
                    }
                }
            }
        }

        if self.config.break_after_acquire_failure {
            let until = Instant::now() + self.config.break_duration();
            self.state.lock().broken_until = Some(until);
            warn!(
                pause_ms = self.config.break_duration().as_millis() as u64,
                "giving up on store after repeated connect failures"
            );
        }

        let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(SynonymError::connection(format!(
            "unable to connect after {attempts} attempts: {cause}"
        )))
    }

    /// Close idle connections past `idle_timeout`, keeping `min_idle` open.
    fn evict_idle(&self, state: &mut PoolState) -> Vec<PoolEntry> {
        let timeout = self.config.idle_timeout;
        let mut evicted = Vec::new();
        while state.idle.len() > self.config.min_idle {
            // Oldest entries sit at the front; the stack pops from the back.
            if state.idle[0].last_used.elapsed() <= timeout {
                break;
            }
            evicted.push(state.idle.remove(0));
        }
        evicted
    }

    fn give_back(&self, conn: Box<dyn Connection>, broken: bool) {
        let mut state = self.state.lock();
        state.leased = state.leased.saturating_sub(1);

        if state.closed || broken {
            drop(state);
            self.close_connection(conn);
        } else {
            state.idle.push(PoolEntry {
                conn,
                last_used: Instant::now(),
            });
            drop(state);
        }
        self.available.notify_one();
    }

    fn finish_lease(&self) {
        let mut state = self.state.lock();
        state.leased = state.leased.saturating_sub(1);
        drop(state);
        self.available.notify_one();
    }

    fn close_connection(&self, conn: Box<dyn Connection>) {
        if let Err(e) = conn.close() {
            warn!(error = %e, "failed to close store connection");
        }
        self.stats.record_closed();
    }
}

/// A connection leased from a [`ConnectionPool`].
///
/// Dropping the lease returns the connection to the pool, or closes it if it
/// was marked broken or the pool has been closed.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<ConnectionPool>,
    broken: bool,
}

impl PooledConnection {
    /// Close the connection on release instead of reusing it.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("released", &self.conn.is_none())
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_deref()
            .expect("connection already released")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_deref_mut()
            .expect("connection already released")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.give_back(conn, self.broken);
        }
    }
}
