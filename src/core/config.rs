/*!
Runtime configuration for the simulation engine.

Collects the policy values a deployment may want to tune: how aggressively
to oversample, how large a key a client may request, the QBER acceptance
threshold, and how long idle sessions survive in the store.
*/

use std::time::Duration;

use crate::core::constants::{
    DEFAULT_MAX_KEY_LENGTH, DEFAULT_OVERSAMPLE_FACTOR, DEFAULT_QBER_THRESHOLD,
    DEFAULT_SESSION_TTL,
};
use crate::core::error::{InputError, Result};

/// Configuration for one engine instance.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Raw qubits generated per requested final-key bit.
    pub oversample_factor: usize,
    /// Upper bound on the requested `key_length`.
    pub max_key_length: usize,
    /// Largest QBER still considered clean.
    pub qber_threshold: f64,
    /// Idle lifetime of a session before eviction.
    pub session_ttl: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            qber_threshold: DEFAULT_QBER_THRESHOLD,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl SimConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the oversampling factor.
    pub fn with_oversample_factor(mut self, factor: usize) -> Self {
        self.oversample_factor = factor;
        self
    }

    /// Set the maximum accepted key length.
    pub fn with_max_key_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    /// Set the QBER acceptance threshold.
    pub fn with_qber_threshold(mut self, threshold: f64) -> Self {
        self.qber_threshold = threshold;
        self
    }

    /// Set the idle session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.oversample_factor < 2 {
            return Err(InputError::InvalidConfig {
                reason: format!(
                    "oversample factor {} leaves no sifting margin (minimum 2)",
                    self.oversample_factor
                ),
            }
            .into());
        }
        if self.max_key_length == 0 {
            return Err(InputError::InvalidConfig {
                reason: "maximum key length must be at least 1".to_string(),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.qber_threshold) {
            return Err(InputError::InvalidConfig {
                reason: format!(
                    "QBER threshold {} outside [0, 1]",
                    self.qber_threshold
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Raw oversampled bit count for a requested key length.
    pub fn raw_length(&self, key_length: usize) -> usize {
        key_length * self.oversample_factor
    }
}
