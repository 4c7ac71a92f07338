//! # Synchronization Error Types
//!
//! The default `wait()` path has no error channel. These errors come from
//! construction, configuration loading, and the opt-in bounded wait.

use thiserror::Error;

use crate::sync::WaitPhase;

/// Errors that can occur when building or driving a barrier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A barrier needs at least one participant.
    #[error("invalid participant count: {0} (must be at least 1)")]
    InvalidParticipantCount(usize),

    /// Configuration could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read {path}: {message}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying IO error, rendered.
        message: String,
    },

    /// A bounded wait polled more often than its budget allowed.
    #[error("spin limit exceeded in {phase} phase after {polls} polls")]
    SpinLimitExceeded {
        /// Phase the thread was spinning in when it gave up.
        phase: WaitPhase,
        /// Total polls spent in this call.
        polls: u64,
    },

    /// Another participant gave up on this barrier.
    #[error("barrier poisoned by a participant that exceeded its spin limit")]
    Poisoned,
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;
