/*!
Constants for the BB84 simulation engine.

Default policy values live here; runtime-tunable copies live in
[`SimConfig`](crate::core::config::SimConfig).
*/

use std::time::Duration;

/// Raw oversampling factor: how many qubits are generated per requested
/// final-key bit. Sifting keeps roughly half of the raw positions, so 4x
/// leaves a comfortable margin over the requested length.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 4;

/// Largest accepted `key_length` for a single run.
pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;

/// QBER at or below this value is considered clean. The simulated channel is
/// noiseless, so any disagreement on the sifted key implies disturbance.
pub const DEFAULT_QBER_THRESHOLD: f64 = 0.0;

/// Idle time after which a session may be evicted from the store.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Number of random bytes in a session identifier token.
pub const SESSION_ID_BYTES: usize = 16;
