//! Core domain logic for classroom sensor monitoring.
//!
//! This crate contains the fundamental types and logic for:
//! - Aggregation: turning irregular state-change events into time-in-state
//! - Messages: decoding sensor payloads into light and temperature readings
//! - Day windows: local calendar day boundaries for daily summaries

pub mod aggregation;
pub mod day;
pub mod message;
pub mod metric;
pub mod reading;
pub mod types;

pub use aggregation::{
    DurationTotal, GRAPH_BUCKETS, HourlyGrid, TimedEvent, bucket_graph, hourly_grid,
    total_duration,
};
pub use day::DayWindow;
pub use message::{MessageError, Readings, SensorMessage};
pub use metric::Metric;
pub use reading::{LightReading, TEMPERATURE_THRESHOLD, TemperatureReading};
pub use types::{CLASSROOM_WIDTH, Classroom, ValidationError};
