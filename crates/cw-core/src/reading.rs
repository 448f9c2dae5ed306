//! Timestamped sensor readings.

use chrono::{DateTime, Utc};

use crate::aggregation::TimedEvent;
use crate::types::Classroom;

/// Readings at or below this temperature count as "below threshold".
pub const TEMPERATURE_THRESHOLD: i32 = 25;

/// A light on/off state reported by a classroom sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightReading {
    pub classroom: Classroom,
    pub is_on: bool,
    pub timestamp: DateTime<Utc>,
}

impl LightReading {
    /// True while the light is on.
    pub const fn is_active(&self) -> bool {
        self.is_on
    }
}

impl TimedEvent for LightReading {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A temperature reading in whole degrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemperatureReading {
    pub classroom: Classroom,
    pub temperature: i32,
    pub timestamp: DateTime<Utc>,
}

impl TemperatureReading {
    /// True while the temperature is at or below [`TEMPERATURE_THRESHOLD`].
    pub const fn is_active(&self) -> bool {
        self.temperature <= TEMPERATURE_THRESHOLD
    }
}

impl TimedEvent for TemperatureReading {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature(value: i32) -> TemperatureReading {
        TemperatureReading {
            classroom: Classroom::new("A101").unwrap(),
            temperature: value,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn temperature_threshold_is_inclusive() {
        assert!(temperature(24).is_active());
        assert!(temperature(25).is_active());
        assert!(!temperature(26).is_active());
        assert!(temperature(-3).is_active());
    }

    #[test]
    fn light_is_active_when_on() {
        let mut reading = LightReading {
            classroom: Classroom::new("A101").unwrap(),
            is_on: true,
            timestamp: Utc::now(),
        };
        assert!(reading.is_active());
        reading.is_on = false;
        assert!(!reading.is_active());
    }
}
