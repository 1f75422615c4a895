/*!
Per-run session state and the protocol stage machine.

One `SessionState` holds every artifact of one simulation run. Stages move
forward only: `Started -> ChannelRun -> Sifted -> Finalized`. The one
sanctioned loop is re-running the channel (the dashboard's "redo" path),
which clears everything downstream so stale sift/results data can never
leak into a new channel run.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::channel::ChannelOutcome;
use crate::core::error::{InvariantError, Result, StateError};
use crate::core::security::Evaluation;
use crate::core::sift::SiftOutcome;
use crate::core::types::{Basis, Bit};
use crate::wrong_stage_err;

/// Protocol stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Alice's raw bits and bases generated
    Started,
    /// Channel simulated, Bob's (and possibly Eve's) outcomes stored
    ChannelRun,
    /// Bases reconciled, sifted keys stored
    Sifted,
    /// QBER estimated and verdict reached
    Finalized,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Started => write!(f, "Started"),
            Stage::ChannelRun => write!(f, "ChannelRun"),
            Stage::Sifted => write!(f, "Sifted"),
            Stage::Finalized => write!(f, "Finalized"),
        }
    }
}

/// All artifacts of one simulation run.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Requested final key length
    pub key_length: usize,
    /// Oversampled raw sequence length
    pub raw_length: usize,
    /// Alice's prepared bits
    pub alice_bits: Vec<Bit>,
    /// Alice's preparation bases
    pub alice_bases: Vec<Basis>,
    /// Bob's measurement bases
    pub bob_bases: Vec<Basis>,
    /// Bob's measured bits
    pub bob_bits: Vec<Bit>,
    /// Whether the eavesdropper was active on the last channel run
    pub eve_active: bool,
    /// Eve's bases, empty unless she was active
    pub eve_bases: Vec<Basis>,
    /// Eve's measured bits, empty unless she was active
    pub eve_bits: Vec<Bit>,
    /// Raw positions kept by sifting, strictly increasing
    pub sifted_indices: Vec<usize>,
    /// Alice's sifted key
    pub sifted_alice_key: Vec<Bit>,
    /// Bob's sifted key
    pub sifted_bob_key: Vec<Bit>,
    /// Estimated error rate, set by finalization
    pub qber: Option<f64>,
    /// Accepted shared secret, set by finalization when secure
    pub final_key: Option<Vec<Bit>>,
    /// Verdict, set by finalization
    pub is_secure: Option<bool>,
    /// Current protocol stage
    pub stage: Stage,
}

impl SessionState {
    /// Create a freshly started session from Alice's generated sequences.
    pub fn new(key_length: usize, alice_bits: Vec<Bit>, alice_bases: Vec<Basis>) -> Result<Self> {
        if alice_bits.len() != alice_bases.len() {
            return Err(InvariantError::LengthMismatch {
                context: "alice bits vs bases",
                left: alice_bits.len(),
                right: alice_bases.len(),
            }
            .into());
        }

        let raw_length = alice_bits.len();
        Ok(Self {
            key_length,
            raw_length,
            alice_bits,
            alice_bases,
            bob_bases: Vec::new(),
            bob_bits: Vec::new(),
            eve_active: false,
            eve_bases: Vec::new(),
            eve_bits: Vec::new(),
            sifted_indices: Vec::new(),
            sifted_alice_key: Vec::new(),
            sifted_bob_key: Vec::new(),
            qber: None,
            final_key: None,
            is_secure: None,
            stage: Stage::Started,
        })
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Reject the operation unless the session has reached `required`.
    pub fn ensure_at_least(&self, required: Stage) -> Result<()> {
        if self.stage >= required {
            Ok(())
        } else {
            Err(StateError::WrongStage {
                expected: required,
                actual: self.stage,
            }
            .into())
        }
    }

    /// Store a channel run, discarding any downstream artifacts.
    ///
    /// Valid from every stage: re-running the channel is the redo path and
    /// resets sifting and results.
    pub fn apply_channel(&mut self, outcome: ChannelOutcome) -> Result<()> {
        if outcome.bob_bases.len() != self.raw_length {
            return Err(InvariantError::LengthMismatch {
                context: "bob bases vs raw",
                left: outcome.bob_bases.len(),
                right: self.raw_length,
            }
            .into());
        }
        if outcome.bob_bits.len() != self.raw_length {
            return Err(InvariantError::LengthMismatch {
                context: "bob bits vs raw",
                left: outcome.bob_bits.len(),
                right: self.raw_length,
            }
            .into());
        }

        self.clear_sift();
        self.clear_results();

        self.bob_bases = outcome.bob_bases;
        self.bob_bits = outcome.bob_bits;
        match outcome.eve {
            Some(record) => {
                self.eve_active = true;
                self.eve_bases = record.bases;
                self.eve_bits = record.bits;
            }
            None => {
                self.eve_active = false;
                self.eve_bases.clear();
                self.eve_bits.clear();
            }
        }

        log::debug!(
            "session advanced {} -> {} (eavesdrop={})",
            self.stage,
            Stage::ChannelRun,
            self.eve_active
        );
        self.stage = Stage::ChannelRun;
        Ok(())
    }

    /// Store a sifting outcome, discarding any results artifacts.
    pub fn apply_sift(&mut self, outcome: SiftOutcome) -> Result<()> {
        if self.stage < Stage::ChannelRun {
            return wrong_stage_err!(Stage::ChannelRun, self.stage);
        }

        for pair in outcome.sifted_indices.windows(2) {
            if pair[0] >= pair[1] {
                return Err(InvariantError::IndexOutOfRange {
                    index: pair[1],
                    len: self.raw_length,
                }
                .into());
            }
        }
        if let Some(&last) = outcome.sifted_indices.last() {
            if last >= self.raw_length {
                return Err(InvariantError::IndexOutOfRange {
                    index: last,
                    len: self.raw_length,
                }
                .into());
            }
        }

        self.clear_results();

        self.sifted_indices = outcome.sifted_indices;
        self.sifted_alice_key = outcome.sifted_alice_key;
        self.sifted_bob_key = outcome.sifted_bob_key;
        self.stage = Stage::Sifted;
        Ok(())
    }

    /// Store the security evaluation and finalize the run.
    pub fn apply_evaluation(&mut self, evaluation: Evaluation) -> Result<()> {
        if self.stage < Stage::Sifted {
            return wrong_stage_err!(Stage::Sifted, self.stage);
        }

        self.qber = Some(evaluation.qber);
        self.is_secure = Some(evaluation.is_secure);
        self.final_key = evaluation.final_key;
        self.stage = Stage::Finalized;
        Ok(())
    }

    fn clear_sift(&mut self) {
        self.sifted_indices.clear();
        self.sifted_alice_key.clear();
        self.sifted_bob_key.clear();
    }

    fn clear_results(&mut self) {
        self.qber = None;
        self.final_key = None;
        self.is_secure = None;
    }
}
