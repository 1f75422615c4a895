/*!
Quantum channel simulation.

Implements the abstracted BB84 measurement model: a receiver measuring in
the sender's basis reads the sender's bit exactly; a receiver measuring in
the other basis gets a uniformly random bit, independent of what was sent.
With an eavesdropper active, Eve measures first in her own basis and resends
a qubit prepared from her own (basis, bit) pair, so Bob measures Eve's qubit
rather than Alice's. That second hop is what raises the QBER.
*/

use crate::core::error::Result;
use crate::core::random::RandomSource;
use crate::core::types::{Basis, Bit};
use crate::length_mismatch_err;

/// What Eve observed while intercepting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EveRecord {
    /// Eve's per-position basis choices
    pub bases: Vec<Basis>,
    /// Eve's measured bits
    pub bits: Vec<Bit>,
}

/// Everything the channel produced for one transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    /// Bob's independently drawn basis choices
    pub bob_bases: Vec<Basis>,
    /// Bob's measured bits
    pub bob_bits: Vec<Bit>,
    /// Present only when the eavesdropper was active
    pub eve: Option<EveRecord>,
}

/// Simulates qubit transmission with an optional intercept-resend attacker.
pub struct ChannelSimulator;

impl ChannelSimulator {
    /// Transmit Alice's prepared qubits to Bob.
    ///
    /// Bob (and Eve, when `eavesdrop` is set) draws a fresh basis per qubit
    /// from `random` — neither knows Alice's basis in advance. All output
    /// sequences have the same length as the input.
    pub fn transmit(
        random: &mut dyn RandomSource,
        alice_bits: &[Bit],
        alice_bases: &[Basis],
        eavesdrop: bool,
    ) -> Result<ChannelOutcome> {
        if alice_bits.len() != alice_bases.len() {
            return length_mismatch_err!(
                "alice bits vs bases",
                alice_bits.len(),
                alice_bases.len()
            );
        }

        let n = alice_bits.len();
        let bob_bases = random.bases(n);

        if !eavesdrop {
            let bob_bits = (0..n)
                .map(|i| Self::measure(alice_bits[i], alice_bases[i], bob_bases[i], random))
                .collect();
            return Ok(ChannelOutcome {
                bob_bases,
                bob_bits,
                eve: None,
            });
        }

        // Eve intercepts every qubit, measures in her own basis, then
        // resends a qubit prepared from what she saw.
        let eve_bases = random.bases(n);
        let eve_bits: Vec<Bit> = (0..n)
            .map(|i| Self::measure(alice_bits[i], alice_bases[i], eve_bases[i], random))
            .collect();

        let bob_bits = (0..n)
            .map(|i| Self::measure(eve_bits[i], eve_bases[i], bob_bases[i], random))
            .collect();

        log::debug!("channel run with eavesdropper across {n} qubits");

        Ok(ChannelOutcome {
            bob_bases,
            bob_bits,
            eve: Some(EveRecord {
                bases: eve_bases,
                bits: eve_bits,
            }),
        })
    }

    /// One measurement: basis match reads the sent bit exactly, mismatch
    /// collapses to a uniform coin flip.
    fn measure(
        sent_bit: Bit,
        sent_basis: Basis,
        receive_basis: Basis,
        random: &mut dyn RandomSource,
    ) -> Bit {
        if sent_basis == receive_basis {
            sent_bit
        } else {
            random.bit()
        }
    }
}
