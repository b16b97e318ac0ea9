use std::collections::{HashMap, HashSet};

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::LedgerError;
use crate::flights::{FlightKey, FlightStatus};
use crate::identity::ActorId;
use crate::treasury::UNIT;
use crate::utils::current_time;

// Constants for oracle consensus
pub const ORACLE_REGISTRATION_FEE: u64 = UNIT; // Stake required to register an oracle
pub const ORACLE_INDEX_COUNT: usize = 3; // Indexes assigned to each oracle
pub const ORACLE_INDEX_SPACE: u8 = 10; // Indexes are drawn from [0, 10)
pub const MIN_ORACLE_RESPONSES: usize = 3; // Matching responses needed to finalize

/// A registered status reporter. Indexes are assigned at registration and
/// never change; only oracles holding the requested index may respond to a
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRecord {
    pub id: ActorId,
    pub indexes: [u8; ORACLE_INDEX_COUNT],
    pub registered_at: u64,
}

/// Broadcast payload asking oracles holding `index` to report on a flight.
/// Delivery is the relay's responsibility, not the engine's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    pub index: u8,
    pub airline: ActorId,
    pub code: String,
    pub timestamp: u64,
}

impl OracleRequest {
    pub fn flight_key(&self) -> FlightKey {
        FlightKey::new(self.airline, &self.code, self.timestamp)
    }
}

/// Lifecycle of a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Broadcast sent, no responses yet.
    Requested,
    /// Responses arriving, quorum not reached.
    Resolving,
    /// Quorum reached and the result handed to the flight registry. Late
    /// responses are still recorded but can never re-trigger finalization.
    Finalized,
}

/// Response bookkeeping for one `(index, flight)` query.
#[derive(Debug)]
pub struct RequestSession {
    pub index: u8,
    pub flight: FlightKey,
    pub status: SessionStatus,
    pub opened_at: u64,
    responses: HashMap<FlightStatus, HashSet<ActorId>>,
}

impl RequestSession {
    fn new(index: u8, flight: FlightKey) -> Self {
        RequestSession {
            index,
            flight,
            status: SessionStatus::Requested,
            opened_at: current_time(),
            responses: HashMap::new(),
        }
    }

    pub fn response_count(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map(|set| set.len()).unwrap_or(0)
    }
}

/// Outcome of recording one oracle response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumOutcome {
    /// Response recorded; quorum not reached yet.
    Pending { responses: usize },
    /// This response completed the quorum. The caller must now resolve the
    /// flight and credit insurees if the status pays out.
    Quorum { status: FlightStatus },
    /// The session was already finalized; the response was recorded for
    /// bookkeeping only.
    AlreadyFinalized,
}

/// Oracle registry and per-request response aggregation.
///
/// Index assignment and request-index selection are derived from a random
/// beacon hashed with the subject identity, so a given engine assigns stable
/// indexes without needing cryptographic randomness.
pub struct OracleEngine {
    beacon: [u8; 32],
    oracles: HashMap<ActorId, OracleRecord>,
    sessions: HashMap<(u8, FlightKey), RequestSession>,
    request_nonce: u64,
}

impl OracleEngine {
    pub fn new(beacon: [u8; 32]) -> Self {
        OracleEngine {
            beacon,
            oracles: HashMap::new(),
            sessions: HashMap::new(),
            request_nonce: 0,
        }
    }

    /// Register the caller as an oracle and assign its indexes.
    pub fn register_oracle(
        &mut self,
        caller: ActorId,
        fee: u64,
    ) -> Result<[u8; ORACLE_INDEX_COUNT], LedgerError> {
        if fee < ORACLE_REGISTRATION_FEE {
            return Err(LedgerError::InsufficientFunds {
                provided: fee,
                required: ORACLE_REGISTRATION_FEE,
            });
        }
        if self.oracles.contains_key(&caller) {
            return Err(LedgerError::AlreadyRegistered);
        }

        let indexes = self.derive_indexes(&caller);
        self.oracles.insert(
            caller,
            OracleRecord {
                id: caller,
                indexes,
                registered_at: current_time(),
            },
        );
        info!("Oracle {} registered with indexes {:?}", caller, indexes);
        Ok(indexes)
    }

    pub fn indexes_of(&self, caller: &ActorId) -> Option<[u8; ORACLE_INDEX_COUNT]> {
        self.oracles.get(caller).map(|o| o.indexes)
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Open a status query for a flight and produce the broadcastable
    /// request. Re-requesting the same flight may select a different index
    /// and opens an independent session; an existing session for the same
    /// key is left untouched.
    pub fn open_request(&mut self, flight: FlightKey) -> OracleRequest {
        let index = self.derive_request_index(&flight);
        self.request_nonce += 1;

        self.sessions
            .entry((index, flight.clone()))
            .or_insert_with(|| RequestSession::new(index, flight.clone()));
        info!(
            "Oracle request opened for flight {} with index {}",
            flight.code, index
        );
        OracleRequest {
            index,
            airline: flight.airline,
            code: flight.code,
            timestamp: flight.timestamp,
        }
    }

    /// Record one oracle's response for an open session.
    pub fn record_response(
        &mut self,
        index: u8,
        flight: FlightKey,
        status: FlightStatus,
        caller: ActorId,
    ) -> Result<QuorumOutcome, LedgerError> {
        let holds_index = self
            .oracles
            .get(&caller)
            .map(|o| o.indexes.contains(&index))
            .unwrap_or(false);
        if !holds_index {
            return Err(LedgerError::IndexMismatch { index });
        }

        let session = self
            .sessions
            .get_mut(&(index, flight))
            .ok_or(LedgerError::UnknownRequest)?;

        // Set semantics: the same oracle repeating the same answer is absorbed.
        session.responses.entry(status).or_default().insert(caller);
        let responses = session.response_count(status);
        debug!(
            "Oracle {} reported {:?} for flight {} ({}/{})",
            caller, status, session.flight.code, responses, MIN_ORACLE_RESPONSES
        );

        if session.status == SessionStatus::Finalized {
            return Ok(QuorumOutcome::AlreadyFinalized);
        }
        session.status = SessionStatus::Resolving;

        if responses >= MIN_ORACLE_RESPONSES {
            session.status = SessionStatus::Finalized;
            info!(
                "Quorum reached for flight {}: {:?} with {} matching responses",
                session.flight.code, status, responses
            );
            return Ok(QuorumOutcome::Quorum { status });
        }
        Ok(QuorumOutcome::Pending { responses })
    }

    pub fn session_status(&self, index: u8, flight: &FlightKey) -> Option<SessionStatus> {
        self.sessions
            .get(&(index, flight.clone()))
            .map(|s| s.status)
    }

    pub fn session(&self, index: u8, flight: &FlightKey) -> Option<&RequestSession> {
        self.sessions.get(&(index, flight.clone()))
    }

    // Indexes are a stable function of (beacon, oracle identity): hash both
    // into a seed and sample distinct values from the index space.
    fn derive_indexes(&self, id: &ActorId) -> [u8; ORACLE_INDEX_COUNT] {
        let mut hasher = Sha256::new();
        hasher.update(self.beacon);
        hasher.update(id.as_bytes());
        hasher.update(b"oracle-index-assignment");
        let seed: [u8; 32] = hasher.finalize().into();
        let mut rng = ChaCha20Rng::from_seed(seed);

        let mut indexes = [0u8; ORACLE_INDEX_COUNT];
        let mut picked = 0;
        while picked < ORACLE_INDEX_COUNT {
            let candidate = rng.gen_range(0..ORACLE_INDEX_SPACE);
            if !indexes[..picked].contains(&candidate) {
                indexes[picked] = candidate;
                picked += 1;
            }
        }
        indexes
    }

    fn derive_request_index(&self, flight: &FlightKey) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(self.beacon);
        hasher.update(self.request_nonce.to_be_bytes());
        hasher.update(flight.airline.as_bytes());
        hasher.update(flight.code.as_bytes());
        hasher.update(flight.timestamp.to_be_bytes());
        let digest = hasher.finalize();
        digest[0] % ORACLE_INDEX_SPACE
    }
}
