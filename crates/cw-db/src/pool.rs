//! Bounded connection pool for async callers.
//!
//! Connections are opened lazily up to the configured size and reused. Callers
//! beyond that size wait for a free slot; the wait is unbounded unless an
//! acquire timeout is configured.
//!
//! A slot is held by the blocking task doing the work, not by the caller. A
//! caller that is dropped mid-operation (e.g. an HTTP client hanging up) does
//! not free its slot until the database work has finished and the connection
//! is back in the idle list.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{Database, DbError};

/// Number of connections when no size is configured.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of open connections.
    pub size: usize,
    /// How long a caller may wait for a free connection. `None` waits forever.
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            acquire_timeout: None,
        }
    }
}

/// Pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No connection became free within the acquire timeout.
    #[error("timed out after {0:?} waiting for a database connection")]
    Timeout(Duration),
    /// The pool was closed.
    #[error("connection pool is closed")]
    Closed,
    /// The blocking database task panicked or was cancelled.
    #[error("database task failed: {0}")]
    TaskFailed(String),
    /// The database operation itself failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// A cloneable handle to a bounded set of [`Database`] connections.
#[derive(Clone)]
pub struct StorePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    path: PathBuf,
    idle: Mutex<Vec<Database>>,
    permits: Arc<Semaphore>,
    acquire_timeout: Option<Duration>,
}

impl PoolInner {
    // Only pop and push happen under the lock, so a poisoned list is still consistent.
    fn idle(&self) -> MutexGuard<'_, Vec<Database>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorePool {
    /// Opens a pool over the database at `path`.
    ///
    /// One connection is opened immediately so that schema creation and
    /// configuration errors surface at startup.
    pub fn open(path: &Path, config: &PoolConfig) -> Result<Self, DbError> {
        let first = Database::open(path)?;
        let size = config.size.max(1);
        tracing::debug!(path = %path.display(), size, "opened connection pool");
        Ok(Self {
            inner: Arc::new(PoolInner {
                path: path.to_path_buf(),
                idle: Mutex::new(vec![first]),
                permits: Arc::new(Semaphore::new(size)),
                acquire_timeout: config.acquire_timeout,
            }),
        })
    }

    /// Runs `operation` on a pooled connection in a blocking task.
    ///
    /// A connection whose task panicked is discarded; a new one is opened on a
    /// later call.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, PoolError>
    where
        F: FnOnce(&mut Database) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.acquire().await?;
        let inner = Arc::clone(&self.inner);

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let idle = inner.idle().pop();
            let mut db = match idle {
                Some(db) => db,
                None => Database::open(&inner.path)?,
            };
            let result = operation(&mut db);
            inner.idle().push(db);
            result
        });

        match task.await {
            Ok(result) => Ok(result?),
            Err(join_error) => {
                tracing::error!(error = %join_error, "database task failed; dropping connection");
                Err(PoolError::TaskFailed(join_error.to_string()))
            }
        }
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, PoolError> {
        let permits = Arc::clone(&self.inner.permits);
        match self.inner.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, permits.acquire_owned())
                .await
                .map_err(|_| PoolError::Timeout(limit))?
                .map_err(|_| PoolError::Closed),
            None => permits.acquire_owned().await.map_err(|_| PoolError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use cw_core::{Classroom, LightReading};

    fn reading(minute: u32) -> LightReading {
        LightReading {
            classroom: Classroom::new("A101").unwrap(),
            is_on: minute % 2 == 0,
            timestamp: Utc
                .with_ymd_and_hms(2025, 1, 15, 9, minute, 0)
                .single()
                .expect("valid test timestamp"),
        }
    }

    fn open_pool(config: &PoolConfig) -> (tempfile::TempDir, StorePool) {
        let temp = tempfile::tempdir().unwrap();
        let pool = StorePool::open(&temp.path().join("cw.db"), config).unwrap();
        (temp, pool)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_appends_all_land() {
        let (_temp, pool) = open_pool(&PoolConfig::default());

        let mut handles = Vec::new();
        for minute in 0..20 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.run(move |db| db.append_light(&reading(minute))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let start = reading(0).timestamp;
        let end = reading(30).timestamp;
        let stored = pool
            .run(move |db| db.light_in_range("A101", start, end))
            .await
            .unwrap();
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_caller_keeps_its_slot_until_work_finishes() {
        let config = PoolConfig {
            size: 1,
            acquire_timeout: None,
        };
        let (_temp, pool) = open_pool(&config);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tracked = |hold: Duration| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            move |db: &mut Database| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(hold);
                let result = db.append_light(&reading(0));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            }
        };

        let slow = pool.run(tracked(Duration::from_millis(300)));
        assert!(
            tokio::time::timeout(Duration::from_millis(50), slow)
                .await
                .is_err()
        );

        pool.run(tracked(Duration::ZERO)).await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);

        // Both rows land: the cancelled caller's work still completed.
        let start = reading(0).timestamp;
        let end = start + chrono::Duration::minutes(1);
        let stored = pool
            .run(move |db| db.light_in_range("A101", start, end))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn acquire_times_out_when_pool_is_busy() {
        let config = PoolConfig {
            size: 1,
            acquire_timeout: Some(Duration::from_millis(50)),
        };
        let (_temp, pool) = open_pool(&config);

        let busy = pool.clone();
        let holder = tokio::spawn(async move {
            busy.run(|_| {
                std::thread::sleep(Duration::from_millis(400));
                Ok(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let result = pool.run(|_| Ok(())).await;
        assert!(matches!(result, Err(PoolError::Timeout(_))));

        holder.await.unwrap().unwrap();
        assert!(pool.run(|_| Ok(())).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn database_errors_are_returned() {
        let (_temp, pool) = open_pool(&PoolConfig::default());

        let result = pool
            .run(|db| {
                db.conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(PoolError::Db(DbError::Sqlite(_)))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicked_task_frees_its_slot() {
        let config = PoolConfig {
            size: 1,
            acquire_timeout: Some(Duration::from_secs(2)),
        };
        let (_temp, pool) = open_pool(&config);

        let result: Result<(), PoolError> = pool.run(|_| panic!("boom")).await;
        assert!(matches!(result, Err(PoolError::TaskFailed(_))));

        // A fresh connection is opened in place of the dropped one.
        assert!(pool.run(|db| db.append_light(&reading(0))).await.is_ok());
    }
}
