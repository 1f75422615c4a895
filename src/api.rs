/*!
The four-step protocol API consumed by the dashboard layer.

`start`, `run_channel`, `sift` and `results` advance one client's session
through the BB84 run. Each call is stateless in itself: the session
identifier (a cookie or token chosen by the host layer) selects the state,
and every response is a serializable DTO with the human-readable encodings
the dashboard renders. Transport framing and session-cookie handling are the
host's concern, not this crate's.
*/

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::channel::ChannelSimulator;
use crate::core::config::SimConfig;
use crate::core::error::{InputError, Result};
use crate::core::random::{OsRandomSource, RandomSource};
use crate::core::security::{SecurityEvaluator, Verdict};
use crate::core::sift::Sifter;
use crate::core::types::encode_sequence;
use crate::session::state::{SessionState, Stage};
use crate::session::store::{SessionId, SessionStore};

/// Request body for `start`.
///
/// The raw integer is kept signed so that a negative `key_length` can be
/// rejected as input rather than mangled by deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    /// Requested final key length
    pub key_length: i64,
}

/// Response for `start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    /// Accepted final key length
    pub key_length: usize,
    /// Raw oversampled bit count
    pub bits_length: usize,
    /// Alice's bits, space-separated `0`/`1`
    pub alice_bits: String,
    /// Alice's bases, space-separated `+`/`x`
    pub alice_bases: String,
}

/// Request body for `run_channel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunChannelRequest {
    /// Whether Eve intercepts this transmission
    pub eavesdrop: bool,
}

/// Response for `run_channel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunChannelResponse {
    /// Whether Eve intercepted
    pub eavesdrop: bool,
    /// Eve's bases, present only when she was active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eve_bases: Option<String>,
    /// Eve's measured bits, present only when she was active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eve_bits: Option<String>,
    /// Bob's bases
    pub bob_bases: String,
    /// Bob's measured bits
    pub bob_bits: String,
}

/// One row of the sifting table shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Raw position
    pub qubit_index: usize,
    /// Alice's basis symbol
    pub alice_basis: String,
    /// Bob's basis symbol
    pub bob_basis: String,
    /// Kept or discarded
    pub is_match: bool,
}

/// Response for `sift`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiftResponse {
    /// Number of kept positions
    pub match_count: usize,
    /// Full per-position table
    pub comparisons: Vec<ComparisonRow>,
}

/// Response for `results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsResponse {
    /// Alice's sifted key
    pub sifted_key_alice: String,
    /// Bob's sifted key
    pub sifted_key_bob: String,
    /// QBER as a percentage with two decimals, e.g. `"12.50"`
    pub qber: String,
    /// Whether Eve was active on the evaluated run
    pub eavesdrop: bool,
    /// Verdict
    pub is_secure: bool,
    /// The shared secret, present only when secure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_key_alice: Option<String>,
}

/// The protocol engine: four steps over a keyed session store.
pub struct ProtocolApi {
    config: SimConfig,
    store: Arc<SessionStore>,
    random: Mutex<Box<dyn RandomSource>>,
}

impl ProtocolApi {
    /// Create an engine with OS randomness and its own store.
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::with_random_source(config, Box::new(OsRandomSource::new()))
    }

    /// Create an engine with an injected random source (deterministic runs).
    pub fn with_random_source(config: SimConfig, random: Box<dyn RandomSource>) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SessionStore::new(config.session_ttl));
        Ok(Self {
            config,
            store,
            random: Mutex::new(random),
        })
    }

    /// The underlying store, for host-driven eviction sweeps.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Begin a fresh run: generate Alice's oversampled bits and bases.
    ///
    /// Always replaces any prior state for the session. Rejects
    /// non-positive or over-limit key lengths without touching state.
    pub fn start(&self, session: &SessionId, request: &StartRequest) -> Result<StartResponse> {
        if request.key_length <= 0 {
            return Err(InputError::NonPositiveKeyLength {
                requested: request.key_length,
            }
            .into());
        }
        let key_length = request.key_length as usize;
        if key_length > self.config.max_key_length {
            return Err(InputError::KeyLengthTooLarge {
                requested: key_length,
                max: self.config.max_key_length,
            }
            .into());
        }

        let raw_length = self.config.raw_length(key_length);
        let (alice_bits, alice_bases) = {
            let mut random = self.lock_random();
            (random.bits(raw_length), random.bases(raw_length))
        };

        let state = SessionState::new(key_length, alice_bits, alice_bases)?;
        let response = StartResponse {
            key_length,
            bits_length: raw_length,
            alice_bits: encode_sequence(&state.alice_bits),
            alice_bases: encode_sequence(&state.alice_bases),
        };

        log::info!("session {session}: started run, key_length={key_length} raw={raw_length}");
        self.store.insert(session.clone(), state);
        Ok(response)
    }

    /// Transmit the qubits, with or without the eavesdropper.
    ///
    /// May be called again on the same run to redo the transmission; any
    /// sifting or results from the previous attempt are discarded.
    pub fn run_channel(
        &self,
        session: &SessionId,
        request: &RunChannelRequest,
    ) -> Result<RunChannelResponse> {
        self.store.with_session(session, |state| {
            let outcome = {
                let mut random = self.lock_random();
                ChannelSimulator::transmit(
                    random.as_mut(),
                    &state.alice_bits,
                    &state.alice_bases,
                    request.eavesdrop,
                )?
            };
            state.apply_channel(outcome)?;

            Ok(RunChannelResponse {
                eavesdrop: state.eve_active,
                eve_bases: state
                    .eve_active
                    .then(|| encode_sequence(&state.eve_bases)),
                eve_bits: state.eve_active.then(|| encode_sequence(&state.eve_bits)),
                bob_bases: encode_sequence(&state.bob_bases),
                bob_bits: encode_sequence(&state.bob_bits),
            })
        })
    }

    /// Reconcile bases and build the comparison table.
    pub fn sift(&self, session: &SessionId) -> Result<SiftResponse> {
        self.store.with_session(session, |state| {
            state.ensure_at_least(Stage::ChannelRun)?;

            let outcome = Sifter::sift(
                &state.alice_bases,
                &state.bob_bases,
                &state.alice_bits,
                &state.bob_bits,
            )?;

            let comparisons = outcome
                .comparisons
                .iter()
                .map(|row| ComparisonRow {
                    qubit_index: row.index,
                    alice_basis: row.alice_basis.to_string(),
                    bob_basis: row.bob_basis.to_string(),
                    is_match: row.is_match,
                })
                .collect();
            let match_count = outcome.match_count;

            state.apply_sift(outcome)?;

            Ok(SiftResponse {
                match_count,
                comparisons,
            })
        })
    }

    /// Estimate the QBER and reach the verdict.
    pub fn results(&self, session: &SessionId) -> Result<ResultsResponse> {
        let threshold = self.config.qber_threshold;
        self.store.with_session(session, |state| {
            state.ensure_at_least(Stage::Sifted)?;

            let evaluation = SecurityEvaluator::evaluate(
                &state.sifted_alice_key,
                &state.sifted_bob_key,
                state.key_length,
                threshold,
            )?;

            let response = ResultsResponse {
                sifted_key_alice: encode_sequence(&state.sifted_alice_key),
                sifted_key_bob: encode_sequence(&state.sifted_bob_key),
                qber: format!("{:.2}", evaluation.qber * 100.0),
                eavesdrop: state.eve_active,
                is_secure: evaluation.is_secure,
                final_key_alice: evaluation.final_key.as_deref().map(encode_sequence),
            };

            let verdict = Verdict::classify(state.eve_active, evaluation.is_secure);
            log::info!(
                "session {session}: finalized, qber={}% verdict={verdict:?}",
                response.qber
            );

            state.apply_evaluation(evaluation)?;
            Ok(response)
        })
    }

    /// End a session explicitly, discarding its state.
    pub fn reset(&self, session: &SessionId) -> bool {
        self.store.remove(session)
    }

    fn lock_random(&self) -> std::sync::MutexGuard<'_, Box<dyn RandomSource>> {
        self.random.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
