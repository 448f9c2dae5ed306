//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Classroom sensor monitor.
///
/// Records light and temperature readings published by classroom sensor
/// boards and serves daily usage summaries over HTTP.
#[derive(Debug, Parser)]
#[command(name = "cw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Subscribe to the sensor feed and serve the HTTP API (default).
    Serve,

    /// Record one raw sensor payload as if it arrived from the broker.
    Ingest {
        /// JSON payload, e.g. '{"isLightOn":"1","temperature":"24","classroom":"A101"}'.
        payload: String,
    },

    /// Show today's usage totals for a classroom.
    Report {
        /// Classroom filter (matches any classroom containing this text).
        #[arg(long)]
        classroom: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the latest reading per classroom.
    Status,
}
