//! Core type definitions with validation.

use std::fmt;

use thiserror::Error;

/// Width of the classroom column in storage.
pub const CLASSROOM_WIDTH: usize = 4;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The value does not fit its fixed-width column.
    #[error("{field} must be at most {max} characters, got {value:?}")]
    TooLong {
        field: &'static str,
        max: usize,
        value: String,
    },
}

/// A validated classroom identifier.
///
/// Classroom identifiers are short codes such as `A101` that partition sensor
/// readings by room. They are stored in a fixed-width column of
/// [`CLASSROOM_WIDTH`] characters, so trailing whitespace is not significant
/// and is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classroom(String);

impl Classroom {
    /// Creates a new classroom identifier after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim_end();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "classroom" });
        }
        if trimmed.chars().count() > CLASSROOM_WIDTH {
            return Err(ValidationError::TooLong {
                field: "classroom",
                max: CLASSROOM_WIDTH,
                value: id,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier right-padded with spaces to the column width.
    pub fn padded(&self) -> String {
        format!("{:<width$}", self.0, width = CLASSROOM_WIDTH)
    }
}

impl TryFrom<String> for Classroom {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Classroom> for String {
    fn from(id: Classroom) -> Self {
        id.0
    }
}

impl fmt::Display for Classroom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Classroom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
