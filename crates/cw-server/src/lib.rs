//! Classroom monitor service library.
//!
//! Wires the sensor feed, the store and the HTTP API together for the `cw` binary.

mod cli;
pub mod commands;
mod config;
pub mod error;
pub mod http;
pub mod ingest;
pub mod query;

pub use cli::{Cli, Commands};
pub use config::{Config, HttpSettings, MqttSettings, PoolSettings};
