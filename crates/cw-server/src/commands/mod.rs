//! CLI subcommand implementations.

pub mod ingest;
pub mod report;
pub mod serve;
pub mod status;
