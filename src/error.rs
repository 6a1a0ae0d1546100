//! Error types shared by every stage of the chain.

use thiserror::Error;

/// Everything that can stop a chain run. All variants are fatal for the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Wrong argument count or malformed/out-of-range parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The mask holds fewer cells than the requested selection size.
    #[error("insufficient selection: requested {requested} cells but only {available} passed the threshold")]
    InsufficientSelection { requested: usize, available: usize },

    /// A collective destination buffer does not match the expected element count.
    #[error("buffer size mismatch on pe {pe}: expected {expected} elements, found {actual}")]
    BufferSizeMismatch {
        pe: usize,
        expected: usize,
        actual: usize,
    },

    /// The underlying transport failed or a peer left the group.
    #[error("transport error: {0}")]
    Transport(String),

    /// The monotonic clock could not be read.
    #[error("timing facility error: {0}")]
    TimingFacility(String),
}

impl ChainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Process exit status used by the binaries.
    pub fn exit_code(&self) -> u8 {
        match self {
            ChainError::Configuration(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_counts() {
        let err = ChainError::InsufficientSelection {
            requested: 10,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('3'));

        let err = ChainError::BufferSizeMismatch {
            pe: 2,
            expected: 64,
            actual: 100,
        };
        assert_eq!(
            err.to_string(),
            "buffer size mismatch on pe 2: expected 64 elements, found 100"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ChainError::configuration("usage").exit_code(), 2);
        assert_eq!(ChainError::transport("closed").exit_code(), 1);
        assert_eq!(ChainError::TimingFacility("clock".into()).exit_code(), 1);
    }
}
