//! Daily usage summaries over stored readings.
//!
//! Every query reads one local calendar day for the classrooms matching a
//! substring filter and runs the duration aggregator over it:
//! - light counts time with the light on
//! - temperature counts time at or below the comfort threshold

use chrono::Local;
use cw_core::{
    DayWindow, DurationTotal, GRAPH_BUCKETS, HourlyGrid, LightReading, Metric,
    TemperatureReading, bucket_graph, hourly_grid, total_duration,
};
use cw_db::{PoolError, StorePool};
use serde::Serialize;

/// Response for the `/daily/all` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalResponse {
    pub total_seconds: i64,
    pub total_minutes: i64,
}

impl From<DurationTotal> for TotalResponse {
    fn from(total: DurationTotal) -> Self {
        Self {
            total_seconds: total.seconds,
            total_minutes: total.minutes,
        }
    }
}

/// One graph bucket after metric-specific scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphValue {
    Whole(i64),
    Scaled(f64),
}

/// Scaled per-bucket values; `None` for buckets without readings.
pub type Graph = [Option<GraphValue>; GRAPH_BUCKETS];

/// Both metrics' totals for one classroom filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub light: TotalResponse,
    pub temperature: TotalResponse,
}

enum DayReadings {
    Light(Vec<LightReading>),
    Temperature(Vec<TemperatureReading>),
}

/// Read-side service shared by the HTTP handlers and the `report` command.
#[derive(Clone)]
pub struct QueryService {
    pool: StorePool,
}

impl QueryService {
    pub const fn new(pool: StorePool) -> Self {
        Self { pool }
    }

    /// Total active time for the day.
    pub async fn total(
        &self,
        metric: Metric,
        classroom: &str,
        day: DayWindow,
    ) -> Result<TotalResponse, PoolError> {
        let total = match self.load(metric, classroom, day).await? {
            DayReadings::Light(readings) => total_duration(&readings, LightReading::is_active),
            DayReadings::Temperature(readings) => {
                total_duration(&readings, TemperatureReading::is_active)
            }
        };
        Ok(total.into())
    }

    /// Active time per 3-hour bucket of the local day, scaled for display.
    pub async fn graph(
        &self,
        metric: Metric,
        classroom: &str,
        day: DayWindow,
    ) -> Result<Graph, PoolError> {
        let buckets = match self.load(metric, classroom, day).await? {
            DayReadings::Light(readings) => {
                bucket_graph(&readings, LightReading::is_active, &Local)
            }
            DayReadings::Temperature(readings) => {
                bucket_graph(&readings, TemperatureReading::is_active, &Local)
            }
        };
        Ok(buckets.map(|bucket| bucket.map(|total| scale_bucket(metric, total))))
    }

    /// Hours of the local day with more than 30 minutes of active time.
    pub async fn hours(
        &self,
        metric: Metric,
        classroom: &str,
        day: DayWindow,
    ) -> Result<HourlyGrid, PoolError> {
        let grid = match self.load(metric, classroom, day).await? {
            DayReadings::Light(readings) => {
                hourly_grid(&readings, LightReading::is_active, &Local)
            }
            DayReadings::Temperature(readings) => {
                hourly_grid(&readings, TemperatureReading::is_active, &Local)
            }
        };
        Ok(grid)
    }

    /// Totals for both metrics.
    pub async fn summary(&self, classroom: &str, day: DayWindow) -> Result<Summary, PoolError> {
        Ok(Summary {
            light: self.total(Metric::Light, classroom, day).await?,
            temperature: self.total(Metric::Temperature, classroom, day).await?,
        })
    }

    async fn load(
        &self,
        metric: Metric,
        classroom: &str,
        day: DayWindow,
    ) -> Result<DayReadings, PoolError> {
        let classroom = classroom.to_string();
        let DayWindow { start, end } = day;
        let readings = match metric {
            Metric::Light => DayReadings::Light(
                self.pool
                    .run(move |db| db.light_in_range(&classroom, start, end))
                    .await?,
            ),
            Metric::Temperature => DayReadings::Temperature(
                self.pool
                    .run(move |db| db.temperature_in_range(&classroom, start, end))
                    .await?,
            ),
        };
        tracing::debug!(%metric, start = %day.start, end = %day.end, "loaded day readings");
        Ok(readings)
    }
}

/// Converts a bucket's active seconds into the unit shown on the dashboard.
///
/// Light uses integer arithmetic (`seconds * 18 / 30`); temperature is
/// `seconds * 2 * 4.7 / 3600`.
#[expect(
    clippy::cast_precision_loss,
    reason = "a day's worth of seconds is far below f64's exact integer range"
)]
pub fn scale_bucket(metric: Metric, total: DurationTotal) -> GraphValue {
    match metric {
        Metric::Light => GraphValue::Whole(total.seconds * 18 / 30),
        Metric::Temperature => GraphValue::Scaled((total.seconds * 2) as f64 * 4.7 / 3600.0),
    }
}
