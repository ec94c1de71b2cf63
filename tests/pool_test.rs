//! Integration tests for the connection pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use dynamic_synonym::config::{JdbcSettings, PoolConfig};
use dynamic_synonym::error::{Result, SynonymError};
use dynamic_synonym::pool::ConnectionPool;
use dynamic_synonym::store::{Connection, ConnectionFactory, Row, Value};

struct CountingConnection;

impl Connection for CountingConnection {
    fn query(&mut self, _sql: &str) -> Result<Vec<Row>> {
        Ok(vec![Row::single("word", Value::Text("fast,quick".to_string()))])
    }

    fn is_valid(&mut self) -> bool {
        true
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Refuses to connect while `down` is set.
#[derive(Default)]
struct FlakyFactory {
    down: AtomicBool,
    attempts: AtomicUsize,
}

impl ConnectionFactory for FlakyFactory {
    fn connect(&self, _settings: &JdbcSettings) -> Result<Box<dyn Connection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(SynonymError::connection("connection refused"))
        } else {
            Ok(Box::new(CountingConnection))
        }
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

fn settings() -> JdbcSettings {
    JdbcSettings {
        url: "test://synonyms".to_string(),
        user: String::new(),
        password: String::new(),
        driver: "flaky".to_string(),
        last_modified_sql: "SELECT 1".to_string(),
        reload_sql: "SELECT 1".to_string(),
    }
}

#[test]
fn test_exhausted_when_all_leased() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    let config = PoolConfig::default()
        .with_max_active(2)
        .with_max_wait(Duration::from_millis(50));
    let pool = ConnectionPool::new(config, settings(), factory)?;

    let first = pool.acquire()?;
    let _second = pool.acquire()?;

    let start = Instant::now();
    let err = pool.acquire().unwrap_err();
    assert!(matches!(err, SynonymError::PoolExhausted(_)));
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(pool.stats().exhausted_count, 1);

    pool.release(first);
    let _third = pool.acquire()?;
    assert_eq!(pool.outstanding(), 2);

    Ok(())
}

#[test]
fn test_waiter_is_woken_by_release() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    let config = PoolConfig::default()
        .with_max_active(1)
        .with_max_wait(Duration::from_secs(5));
    let pool = ConnectionPool::new(config, settings(), factory)?;

    let held = pool.acquire()?;
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.acquire().map(|_| ()))
    };

    thread::sleep(Duration::from_millis(20));
    drop(held);
    waiter.join().unwrap()?;
    assert_eq!(pool.outstanding(), 0);

    Ok(())
}

#[test]
fn test_retry_then_breaker() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    factory.down.store(true, Ordering::SeqCst);

    let config = PoolConfig::default()
        .with_initial_size(0)
        .with_retry_attempts(3)
        .with_time_between_connect_error(Duration::from_millis(10))
        .with_break_after_acquire_failure(true);
    let pool = ConnectionPool::new(config, settings(), Arc::clone(&factory) as Arc<dyn ConnectionFactory>)?;

    let err = pool.acquire().unwrap_err();
    assert!(matches!(err, SynonymError::Connection(_)));
    assert!(err.is_retriable());
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(pool.stats().connect_failures, 3);
    assert_eq!(pool.outstanding(), 0);

    // Breaker is open: fail fast without dialing.
    let err = pool.acquire().unwrap_err();
    assert!(matches!(err, SynonymError::Connection(_)));
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 3);

    // After the pause one trial connect goes through.
    factory.down.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(40));
    let conn = pool.acquire()?;
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 4);
    drop(conn);
    assert_eq!(pool.idle_count(), 1);

    Ok(())
}

#[test]
fn test_open_breaker_still_serves_idle_connections() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    let config = PoolConfig::default()
        .with_initial_size(0)
        .with_max_active(2)
        .with_retry_attempts(1)
        .with_time_between_connect_error(Duration::from_secs(5))
        .with_break_after_acquire_failure(true);
    let pool = ConnectionPool::new(config, settings(), Arc::clone(&factory) as Arc<dyn ConnectionFactory>)?;

    let held = pool.acquire()?;
    factory.down.store(true, Ordering::SeqCst);
    assert!(matches!(pool.acquire(), Err(SynonymError::Connection(_))));
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);

    drop(held);
    assert_eq!(pool.idle_count(), 1);

    let start = Instant::now();
    let reused = pool.acquire()?;
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);

    // No idle connection left, so the open breaker refuses to dial.
    assert!(matches!(pool.acquire(), Err(SynonymError::Connection(_))));
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);

    drop(reused);
    assert_eq!(pool.outstanding(), 0);

    Ok(())
}

#[test]
fn test_without_breaker_every_acquire_dials() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    factory.down.store(true, Ordering::SeqCst);

    let config = PoolConfig::default()
        .with_initial_size(0)
        .with_retry_attempts(2)
        .with_time_between_connect_error(Duration::from_millis(1))
        .with_break_after_acquire_failure(false);
    let pool = ConnectionPool::new(config, settings(), Arc::clone(&factory) as Arc<dyn ConnectionFactory>)?;

    assert!(pool.acquire().is_err());
    assert!(pool.acquire().is_err());
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 4);

    Ok(())
}

#[test]
fn test_broken_connection_is_not_reused() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    let pool = ConnectionPool::new(
        PoolConfig::default().with_initial_size(0),
        settings(),
        Arc::clone(&factory) as Arc<dyn ConnectionFactory>,
    )?;

    let mut conn = pool.acquire()?;
    conn.mark_broken();
    drop(conn);
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.stats().connections_closed, 1);

    let _conn = pool.acquire()?;
    assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);

    Ok(())
}

#[test]
fn test_concurrent_acquire_stays_bounded() -> Result<()> {
    let factory = Arc::new(FlakyFactory::default());
    let config = PoolConfig::default()
        .with_max_active(3)
        .with_max_wait(Duration::from_secs(10));
    let pool = ConnectionPool::new(config, settings(), Arc::clone(&factory) as Arc<dyn ConnectionFactory>)?;

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || -> Result<()> {
                for _ in 0..50 {
                    let mut conn = pool.acquire()?;
                    assert!(pool.outstanding() <= 3);
                    let rows = conn.query("SELECT words AS word FROM synonyms")?;
                    assert_eq!(rows.len(), 1);
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap()?;
    }

    assert_eq!(pool.outstanding(), 0);
    assert!(factory.attempts.load(Ordering::SeqCst) <= 3);
    assert_eq!(pool.stats().acquisitions, 400);

    Ok(())
}

#[test]
fn test_closed_pool_refuses_acquire() -> Result<()> {
    let pool = ConnectionPool::new(PoolConfig::default(), settings(), Arc::new(FlakyFactory::default()))?;
    let held = pool.acquire()?;
    pool.close();

    assert!(matches!(pool.acquire(), Err(SynonymError::PoolExhausted(_))));
    drop(held);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.idle_count(), 0);

    Ok(())
}
