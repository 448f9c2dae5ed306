//! Ingest command for recording a payload without a broker.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::Utc;

use crate::ingest::{IngestOutcome, Ingestor};

/// Runs `payload` through the same path as a broker message, stamped with the current time.
///
/// A malformed payload is an error here so that scripts notice it.
pub async fn run<W: Write>(writer: &mut W, ingestor: &Ingestor, payload: &str) -> Result<()> {
    match ingestor.handle_payload(payload.as_bytes(), Utc::now()).await? {
        IngestOutcome::Stored {
            classroom,
            temperature: true,
        } => writeln!(writer, "Recorded light and temperature for {classroom}.")?,
        IngestOutcome::Stored {
            classroom,
            temperature: false,
        } => writeln!(
            writer,
            "Recorded light for {classroom}; temperature was not a number."
        )?,
        IngestOutcome::Dropped => bail!("malformed sensor payload; nothing recorded"),
    }
    Ok(())
}
