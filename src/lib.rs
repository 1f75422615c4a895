/*!
# QKD Sim

A pedagogical BB84 quantum-key-distribution simulation engine, driven by a
dashboard through four calls: `start`, `run_channel`, `sift`, `results`.

## Overview

This library models the BB84 protocol with an optional intercept-resend
eavesdropper:

- Alice prepares an oversampled run of random bits in random bases
- The channel computes Bob's (and optionally Eve's) measurement outcomes
- Sifting discards every position where the bases disagreed
- The security evaluation estimates the QBER over the sifted key and either
  releases the shared secret or aborts the run

Each connected client owns one session; sessions are isolated in an
expiring store and advance through a monotonic stage machine. Randomness is
an injected capability, so a seeded source reproduces a run exactly.

This is a teaching simulation. It performs no real cryptography, speaks to
no quantum hardware, and must not be mistaken for a secure key exchange.
*/

// Core protocol components
pub mod core;

// Session state and store
pub mod session;

// The four-step API surface
pub mod api;

// Re-export commonly used types for convenience
pub use api::{
    ProtocolApi, ResultsResponse, RunChannelRequest, RunChannelResponse, SiftResponse,
    StartRequest, StartResponse,
};
pub use core::config::SimConfig;
pub use core::error::{Error, InputError, InvariantError, Result, StateError};
pub use core::random::{OsRandomSource, RandomSource, SeededRandomSource};
pub use core::security::Verdict;
pub use core::types::{Basis, Bit};
pub use session::state::{SessionState, Stage};
pub use session::store::{SessionId, SessionStore};
