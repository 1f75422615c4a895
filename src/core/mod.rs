//! Core components of the BB84 simulation.
//!
//! This module contains the protocol building blocks: the value types,
//! the randomness capability, the channel/sifting/security stages, and
//! error handling and configuration.

// Value types (bits, bases, encodings)
pub mod types;

// Randomness capability
pub mod random;

// Quantum channel with the intercept-resend attacker
pub mod channel;

// Basis reconciliation
pub mod sift;

// QBER estimation and the acceptance decision
pub mod security;

// Engine constants
pub mod constants;

// Runtime configuration
pub mod config;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::channel::{ChannelOutcome, ChannelSimulator, EveRecord};
pub use self::config::SimConfig;
pub use self::error::{Error, InputError, InvariantError, Result, StateError};
pub use self::random::{OsRandomSource, RandomSource, SeededRandomSource};
pub use self::security::{Evaluation, SecurityEvaluator, Verdict};
pub use self::sift::{Comparison, SiftOutcome, Sifter};
pub use self::types::{Basis, Bit};
