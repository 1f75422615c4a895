/*!
Basis reconciliation (sifting).

Pure and deterministic: a position survives iff Alice and Bob happened to
choose the same basis. With independent uniform basis draws on a 2-symbol
alphabet, roughly half of the raw positions survive on average.
*/

use crate::core::error::Result;
use crate::core::types::{Basis, Bit};
use crate::length_mismatch_err;

/// One row of the per-position reconciliation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    /// Position in the raw sequence
    pub index: usize,
    /// Basis Alice prepared in
    pub alice_basis: Basis,
    /// Basis Bob measured in
    pub bob_basis: Basis,
    /// Whether the position is kept
    pub is_match: bool,
}

/// Result of reconciling one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiftOutcome {
    /// Full per-position comparison table, in index order
    pub comparisons: Vec<Comparison>,
    /// Number of kept positions
    pub match_count: usize,
    /// Kept positions, strictly increasing
    pub sifted_indices: Vec<usize>,
    /// Alice's bits at the kept positions
    pub sifted_alice_key: Vec<Bit>,
    /// Bob's bits at the kept positions
    pub sifted_bob_key: Vec<Bit>,
}

/// Performs basis reconciliation.
pub struct Sifter;

impl Sifter {
    /// Compare the two basis sequences and extract the sifted keys.
    ///
    /// `sifted_alice_key[k]` and `sifted_bob_key[k]` always refer to the
    /// same raw position, `sifted_indices[k]`.
    pub fn sift(
        alice_bases: &[Basis],
        bob_bases: &[Basis],
        alice_bits: &[Bit],
        bob_bits: &[Bit],
    ) -> Result<SiftOutcome> {
        if alice_bases.len() != bob_bases.len() {
            return length_mismatch_err!("alice vs bob bases", alice_bases.len(), bob_bases.len());
        }
        if alice_bits.len() != alice_bases.len() {
            return length_mismatch_err!("alice bits vs bases", alice_bits.len(), alice_bases.len());
        }
        if bob_bits.len() != bob_bases.len() {
            return length_mismatch_err!("bob bits vs bases", bob_bits.len(), bob_bases.len());
        }

        let n = alice_bases.len();
        let mut comparisons = Vec::with_capacity(n);
        let mut sifted_indices = Vec::new();
        let mut sifted_alice_key = Vec::new();
        let mut sifted_bob_key = Vec::new();

        for i in 0..n {
            let is_match = alice_bases[i] == bob_bases[i];
            comparisons.push(Comparison {
                index: i,
                alice_basis: alice_bases[i],
                bob_basis: bob_bases[i],
                is_match,
            });
            if is_match {
                sifted_indices.push(i);
                sifted_alice_key.push(alice_bits[i]);
                sifted_bob_key.push(bob_bits[i]);
            }
        }

        Ok(SiftOutcome {
            match_count: sifted_indices.len(),
            comparisons,
            sifted_indices,
            sifted_alice_key,
            sifted_bob_key,
        })
    }
}
