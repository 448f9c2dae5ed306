//! Metric enum as the single source of truth for metric names.

use std::fmt;

/// The kinds of sensor readings that are stored and summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Light on/off state.
    Light,
    /// Temperature in whole degrees.
    Temperature,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Self; 2] = [Self::Light, Self::Temperature];

    /// Lowercase name used in URLs and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
