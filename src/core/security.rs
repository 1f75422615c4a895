/*!
QBER estimation and the accept/reject decision.

Sampling policy: the full sifted keys are compared position by position,
with no disclosed-subsample split. Real BB84 discloses and discards a random
sample to estimate the error rate without burning the whole key; comparing
everything is a pedagogical simplification that matches the dashboard this
engine drives, and it is not cryptographically faithful. The retained secret
is simply the leading `requested_key_length` bits of Alice's sifted key.
*/

use crate::core::error::Result;
use crate::core::types::Bit;
use crate::length_mismatch_err;

/// How a finished run should be presented to the user.
///
/// Eavesdropping does not guarantee a detectable error: per intercepted
/// matched-basis position there is a 3/4 chance no disagreement appears, so
/// a clean QBER with Eve active is possible and must stay distinguishable
/// from a genuinely quiet channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Channel clean, no eavesdropper was active
    Secure,
    /// Channel looked clean, but the eavesdropper was active and went undetected
    EveUndetected,
    /// Errors above threshold or too few sifted bits; run aborted
    Compromised,
}

impl Verdict {
    /// Classify a finished evaluation against the eavesdrop flag.
    pub fn classify(eavesdrop: bool, is_secure: bool) -> Self {
        match (is_secure, eavesdrop) {
            (true, false) => Verdict::Secure,
            (true, true) => Verdict::EveUndetected,
            (false, _) => Verdict::Compromised,
        }
    }
}

/// Outcome of evaluating one sifted key.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Estimated quantum bit error rate, in `[0, 1]`
    pub qber: f64,
    /// Whether enough sifted bits survived for the requested key
    pub sufficient_bits: bool,
    /// Whether the run is accepted
    pub is_secure: bool,
    /// The shared secret, present only when accepted
    pub final_key: Option<Vec<Bit>>,
}

/// Estimates the error rate and applies the acceptance policy.
pub struct SecurityEvaluator;

impl SecurityEvaluator {
    /// Evaluate a sifted key pair.
    ///
    /// `qber` is the disagreement fraction over the whole sifted key, `0.0`
    /// for an empty one (the empty case is rejected as insufficient rather
    /// than celebrated as error-free). Acceptance requires the QBER at or
    /// under `qber_threshold` and at least `requested_key_length` sifted
    /// bits.
    pub fn evaluate(
        sifted_alice_key: &[Bit],
        sifted_bob_key: &[Bit],
        requested_key_length: usize,
        qber_threshold: f64,
    ) -> Result<Evaluation> {
        if sifted_alice_key.len() != sifted_bob_key.len() {
            return length_mismatch_err!(
                "sifted keys",
                sifted_alice_key.len(),
                sifted_bob_key.len()
            );
        }

        let sifted_len = sifted_alice_key.len();
        let errors = sifted_alice_key
            .iter()
            .zip(sifted_bob_key)
            .filter(|(a, b)| a.differs(**b))
            .count();

        let qber = if sifted_len > 0 {
            errors as f64 / sifted_len as f64
        } else {
            0.0
        };

        let sufficient_bits = sifted_len >= requested_key_length;
        let is_secure = sufficient_bits && qber <= qber_threshold;

        let final_key = if is_secure {
            Some(sifted_alice_key[..requested_key_length].to_vec())
        } else {
            None
        };

        log::debug!(
            "evaluated run: sifted_len={sifted_len} errors={errors} qber={qber:.4} secure={is_secure}"
        );

        Ok(Evaluation {
            qber,
            sufficient_bits,
            is_secure,
            final_key,
        })
    }
}
