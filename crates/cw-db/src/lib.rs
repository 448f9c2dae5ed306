//! Storage layer for classroom sensor readings.
//!
//! Provides append-only persistence for light and temperature readings using
//! `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. Async callers go through
//! [`StorePool`], which hands each connection to one blocking task at a time.
//!
//! # Schema
//!
//! One table per metric (`light_status`, `temperature_status`). Rows are never
//! updated or deleted. The `id` column only exists to give readings with the
//! same timestamp a stable order.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with nine fractional digits
//! (e.g., `2025-01-15T10:30:00.000000000Z`). The fixed width keeps
//! lexicographic ordering identical to chronological ordering.
//!
//! ## Classroom Column
//!
//! `classroom` is `CHAR(4)`: values are right-padded with spaces on write and
//! the padding is stripped on read. Range queries filter classrooms by
//! case-sensitive substring (`instr`) of the unpadded value, not equality.

mod pool;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use cw_core::{Classroom, LightReading, Metric, TemperatureReading, ValidationError};
use rusqlite::{Connection, Row, params};
use thiserror::Error;

pub use pool::{DEFAULT_POOL_SIZE, PoolConfig, PoolError, StorePool};

/// How long a connection waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp in {table}: {timestamp}")]
    TimestampParse {
        table: &'static str,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored classroom value no longer passes validation.
    #[error("invalid classroom in {table}: {source}")]
    InvalidClassroom {
        table: &'static str,
        #[source]
        source: ValidationError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Most recent reading time for one classroom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomLastReading {
    pub classroom: String,
    pub last_reading: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // journal_mode returns the resulting mode as a row
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- light_status: on/off state per classroom
            -- timestamp: RFC 3339, nanosecond precision (e.g., '2025-01-15T10:30:00.000000000Z')
            CREATE TABLE IF NOT EXISTS light_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                is_on INTEGER NOT NULL,
                classroom CHAR(4) NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_light_status_timestamp ON light_status(timestamp);

            -- temperature_status: whole-degree readings per classroom
            CREATE TABLE IF NOT EXISTS temperature_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature INTEGER NOT NULL,
                classroom CHAR(4) NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_temperature_status_timestamp ON temperature_status(timestamp);
            ",
        )?;
        Ok(())
    }

    /// Appends one light reading.
    pub fn append_light(&self, reading: &LightReading) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO light_status (is_on, classroom, timestamp) VALUES (?, ?, ?)",
            params![
                reading.is_on,
                reading.classroom.padded(),
                format_timestamp(reading.timestamp),
            ],
        )?;
        Ok(())
    }

    /// Appends one temperature reading.
    pub fn append_temperature(&self, reading: &TemperatureReading) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO temperature_status (temperature, classroom, timestamp) VALUES (?, ?, ?)",
            params![
                reading.temperature,
                reading.classroom.padded(),
                format_timestamp(reading.timestamp),
            ],
        )?;
        Ok(())
    }

    /// Lists light readings for classrooms containing `classroom` within a time range.
    ///
    /// The range is inclusive of `start` and exclusive of `end`.
    pub fn light_in_range(
        &self,
        classroom: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LightReading>, DbError> {
        self.query_range(Metric::Light, classroom, start, end, |row| {
            Ok(LightReading {
                is_on: row.get(0)?,
                classroom: parse_classroom(&row.get::<_, String>(1)?, "light_status")?,
                timestamp: parse_timestamp(&row.get::<_, String>(2)?, "light_status")?,
            })
        })
    }

    /// Lists temperature readings for classrooms containing `classroom` within a time range.
    ///
    /// The range is inclusive of `start` and exclusive of `end`.
    pub fn temperature_in_range(
        &self,
        classroom: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TemperatureReading>, DbError> {
        self.query_range(Metric::Temperature, classroom, start, end, |row| {
            Ok(TemperatureReading {
                temperature: row.get(0)?,
                classroom: parse_classroom(&row.get::<_, String>(1)?, "temperature_status")?,
                timestamp: parse_timestamp(&row.get::<_, String>(2)?, "temperature_status")?,
            })
        })
    }

    /// Lists the last reading timestamp per classroom, ordered by most recent.
    pub fn latest_by_classroom(&self, metric: Metric) -> Result<Vec<ClassroomLastReading>, DbError> {
        let table = table_name(metric);
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT RTRIM(classroom) AS room, MAX(timestamp) AS last_reading
            FROM {table}
            GROUP BY room
            ORDER BY last_reading DESC, room ASC
            "
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(ClassroomLastReading {
                classroom: row.get(0)?,
                last_reading: row.get(1)?,
            })
        })?;
        let mut classrooms = Vec::new();
        for row in rows {
            classrooms.push(row?);
        }
        Ok(classrooms)
    }

    fn query_range<T, F>(
        &self,
        metric: Metric,
        classroom: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        map_row: F,
    ) -> Result<Vec<T>, DbError>
    where
        F: Fn(&Row<'_>) -> Result<T, DbError>,
    {
        if end <= start {
            return Ok(Vec::new());
        }
        let table = table_name(metric);
        let value_column = match metric {
            Metric::Light => "is_on",
            Metric::Temperature => "temperature",
        };
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {value_column}, classroom, timestamp
            FROM {table}
            WHERE timestamp >= ? AND timestamp < ? AND instr(RTRIM(classroom), ?) > 0
            ORDER BY timestamp ASC, id ASC
            "
        ))?;
        let mut rows = stmt.query(params![
            format_timestamp(start),
            format_timestamp(end),
            classroom,
        ])?;
        let mut readings = Vec::new();
        while let Some(row) = rows.next()? {
            readings.push(map_row(row)?);
        }
        Ok(readings)
    }
}

const fn table_name(metric: Metric) -> &'static str {
    match metric {
        Metric::Light => "light_status",
        Metric::Temperature => "temperature_status",
    }
}

fn parse_classroom(stored: &str, table: &'static str) -> Result<Classroom, DbError> {
    Classroom::new(stored).map_err(|source| DbError::InvalidClassroom { table, source })
}

fn parse_timestamp(timestamp: &str, table: &'static str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            table,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}
