//! Error types for lrukit

use std::fmt;

/// Result type alias for lrukit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least one entry
    InvalidCapacity(usize),

    /// Index and ordering disagree (reported by `check_invariants`)
    Inconsistent(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => {
                write!(f, "Invalid capacity: {} (must be greater than 0)", cap)
            }
            Error::Inconsistent(msg) => write!(f, "Inconsistent cache state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
