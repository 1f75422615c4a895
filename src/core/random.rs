/*!
Randomness as a swappable capability.

Every probabilistic step of the simulation (Alice's preparation, Bob's and
Eve's basis choices, mismatched-basis measurement outcomes) draws from a
`RandomSource` injected by the caller, so tests can substitute a seeded
generator without touching any global state.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::types::{Basis, Bit};

/// Uniform source of bits and basis choices.
///
/// Each drawn element is independent and uniform over its 2-symbol domain.
pub trait RandomSource: Send {
    /// Draw one uniform bit.
    fn bit(&mut self) -> Bit;

    /// Draw one uniform basis choice.
    fn basis(&mut self) -> Basis;

    /// Draw `n` independent uniform bits.
    fn bits(&mut self, n: usize) -> Vec<Bit> {
        (0..n).map(|_| self.bit()).collect()
    }

    /// Draw `n` independent uniform basis choices.
    fn bases(&mut self, n: usize) -> Vec<Basis> {
        (0..n).map(|_| self.basis()).collect()
    }
}

/// OS-seeded random source for normal operation.
pub struct OsRandomSource {
    rng: StdRng,
}

impl OsRandomSource {
    /// Create a source seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for OsRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandomSource {
    fn bit(&mut self) -> Bit {
        Bit::from(self.rng.random_bool(0.5))
    }

    fn basis(&mut self) -> Basis {
        Basis::from(self.rng.random_bool(0.5))
    }
}

/// Deterministic random source for reproducible runs.
///
/// Two sources built from the same seed produce identical draw sequences.
pub struct SeededRandomSource {
    rng: StdRng,
}

impl SeededRandomSource {
    /// Create a source from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn bit(&mut self) -> Bit {
        Bit::from(self.rng.random_bool(0.5))
    }

    fn basis(&mut self) -> Basis {
        Basis::from(self.rng.random_bool(0.5))
    }
}
