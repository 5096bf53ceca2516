//! Error types for xipboot-core
//!
//! This module provides a no_std compatible error type shared by the
//! transport engine, the mode controller and the hand-off sequencer.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// The taxonomy is deliberately small: every transport and mode-control
/// operation either succeeds or surfaces one of these three codes to the
/// external flash driver, which owns all retry/backoff decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid call (empty transaction, mode operation on the wrong
    /// binding), a write attempted while the transport is memory mapped,
    /// or scratch-buffer exhaustion before any bus activity
    WriteError,
    /// Command-phase or data-phase bus failure, or invalid frame
    /// construction (mis-framed command stream, bad line-width value)
    ReadError,
    /// A bus primitive exceeded its hardware timeout budget
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteError => write!(f, "write operation failed"),
            Self::ReadError => write!(f, "read operation failed"),
            Self::Timeout => write!(f, "operation timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
