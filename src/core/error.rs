/*!
Error handling for the simulation engine.

Three error classes with different recovery stories:

- [`InputError`] — the caller sent something invalid; retry with corrected
  input. Never mutates session state.
- [`StateError`] — an operation arrived before its prerequisite stage, or the
  session is unknown/expired; retry after restarting the run. State unchanged.
- [`InvariantError`] — a sequence-length or index invariant broke. Unreachable
  in correct code; surfaced as an internal failure, never retried, and never
  affects other sessions.
*/

use thiserror::Error;

use crate::session::state::Stage;

/// Result type for the simulation engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid caller input, rejected before any mutation
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// Operation out of order or session missing
    #[error("invalid session state: {0}")]
    State(#[from] StateError),

    /// Broken internal invariant (a bug, not a caller mistake)
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantError),
}

impl Error {
    /// Whether the caller can recover by correcting input or restarting the
    /// session. Invariant violations are not user-recoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Invariant(_))
    }
}

/// Rejected caller input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// Requested key length was zero or negative
    #[error("key length must be a positive integer, got {requested}")]
    NonPositiveKeyLength {
        /// The rejected value
        requested: i64,
    },

    /// Requested key length exceeds the configured maximum
    #[error("key length {requested} exceeds the maximum of {max}")]
    KeyLengthTooLarge {
        /// The rejected value
        requested: usize,
        /// Configured upper bound
        max: usize,
    },

    /// Engine configuration failed validation
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },
}

/// Operation rejected because of session state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No session exists for the given identifier
    #[error("no active session (not started or expired)")]
    UnknownSession,

    /// Operation invoked before its prerequisite stage
    #[error("operation requires stage {expected}, session is at {actual}")]
    WrongStage {
        /// Stage the operation needs
        expected: Stage,
        /// Stage the session is actually in
        actual: Stage,
    },
}

/// Broken internal invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    /// Parallel sequences disagree on length
    #[error("{context}: sequence lengths {left} and {right} disagree")]
    LengthMismatch {
        /// Which sequences disagreed
        context: &'static str,
        /// First length
        left: usize,
        /// Second length
        right: usize,
    },

    /// A stored index points outside the raw sequence range
    #[error("sifted index {index} outside raw range 0..{len}")]
    IndexOutOfRange {
        /// The offending index
        index: usize,
        /// Raw sequence length
        len: usize,
    },
}

/// Create a wrong-stage state error
#[macro_export]
macro_rules! wrong_stage_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::State(
            $crate::core::error::StateError::WrongStage {
                expected: $expected,
                actual: $actual,
            },
        ))
    };
}

/// Create a length-mismatch invariant error
#[macro_export]
macro_rules! length_mismatch_err {
    ($context:expr, $left:expr, $right:expr) => {
        Err($crate::core::error::Error::Invariant(
            $crate::core::error::InvariantError::LengthMismatch {
                context: $context,
                left: $left,
                right: $right,
            },
        ))
    };
}
