//! Error types for the import pipeline.

use thiserror::Error;

/// Main error type for import operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The sample provider could not deliver a requested sample.
    #[error("provider failed reading {channel}: {reason}")]
    Provider { channel: &'static str, reason: String },

    /// Sample index out of bounds
    #[error("sample index {index} out of bounds (count: {count})")]
    SampleOutOfBounds { index: usize, count: usize },

    /// An attribute's source length matches neither the face-vertex count
    /// nor the point count. The channel is dropped for the current topology.
    #[error("invalid {name} attribute: {values} values for {corners} corners / {points} points")]
    InvalidAttribute {
        name: &'static str,
        values: usize,
        corners: usize,
        points: usize,
    },

    /// Internal inconsistency (e.g. synthesis requested with empty inputs).
    /// Never fatal; the offending channel is cleared.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create a provider error for a channel.
    pub fn provider(channel: &'static str, reason: impl Into<String>) -> Self {
        Self::Provider {
            channel,
            reason: reason.into(),
        }
    }

    /// Create an internal inconsistency error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::provider("points", "archive truncated");
        assert!(e.to_string().contains("points"));

        let e = Error::SampleOutOfBounds { index: 5, count: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));
    }

    #[test]
    fn test_invalid_attribute_display() {
        let e = Error::InvalidAttribute {
            name: "uv0",
            values: 7,
            corners: 6,
            points: 4,
        };
        let s = e.to_string();
        assert!(s.contains("uv0"));
        assert!(s.contains("7"));
    }
}
