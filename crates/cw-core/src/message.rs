//! Inbound sensor messages and their normalization into readings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::reading::{LightReading, TemperatureReading};
use crate::types::{Classroom, ValidationError};

/// Reasons a payload cannot be turned into readings.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The payload bytes are not UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
    /// The payload is not a JSON object with the expected fields.
    #[error("payload does not match the sensor message shape: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The classroom field cannot be stored.
    #[error("invalid classroom: {0}")]
    InvalidClassroom(#[from] ValidationError),
}

/// A message as published by the classroom sensor boards.
///
/// Every field is sent as a string. Boards running older firmware use the
/// unprefixed field names, which are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SensorMessage {
    /// `"1"` when the light is on.
    #[serde(rename = "wodnjsqkqh_isLightOn", alias = "isLightOn")]
    pub is_light_on: String,
    /// Temperature in whole degrees, as decimal digits.
    #[serde(rename = "wodnjsqkqh_temperature", alias = "temperature")]
    pub temperature: String,
    #[serde(rename = "wodnjsqkqh_classroom", alias = "classroom")]
    pub classroom: String,
}

/// Readings derived from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readings {
    pub light: LightReading,
    /// Absent when the temperature field is not an integer.
    pub temperature: Option<TemperatureReading>,
}

impl SensorMessage {
    /// Decodes a raw payload.
    pub fn parse(payload: &[u8]) -> Result<Self, MessageError> {
        let text = std::str::from_utf8(payload)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Converts the message into readings stamped with `received_at`.
    ///
    /// The light reading is always produced. A non-numeric temperature only
    /// drops the temperature reading.
    pub fn into_readings(self, received_at: DateTime<Utc>) -> Result<Readings, MessageError> {
        let classroom = Classroom::new(self.classroom)?;

        let temperature = match self.temperature.parse::<i32>() {
            Ok(value) => Some(TemperatureReading {
                classroom: classroom.clone(),
                temperature: value,
                timestamp: received_at,
            }),
            Err(e) => {
                tracing::debug!(
                    %classroom,
                    raw = %self.temperature,
                    error = %e,
                    "skipping non-numeric temperature"
                );
                None
            }
        };

        let light = LightReading {
            classroom,
            is_on: self.is_light_on == "1",
            timestamp: received_at,
        };

        Ok(Readings { light, temperature })
    }
}
