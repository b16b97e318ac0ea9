use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::identity::ActorId;
use crate::treasury::UNIT;
use crate::utils::current_time;

// Constants for airline governance
pub const SEED_FUND: u64 = 10 * UNIT; // Minimum deposit for write privileges
pub const AIRLINE_CONSENSUS_THRESHOLD: usize = 4; // Network size at which admission switches to voting

/// A governance participant. Registration and funding are independent flags:
/// an airline is admitted first and gains write privileges only once it has
/// deposited the seed fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub id: ActorId,
    pub registered: bool,
    pub funded: bool,
    pub funded_amount: u64,
    pub registered_at: u64,
}

/// Result of a `register` call once the caller's vote has been counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The candidate is now a registered airline.
    Registered,
    /// A vote was recorded but quorum has not been reached yet.
    VoteRecorded { votes: usize, needed: usize },
}

/// Airline registry with funding status and admission voting.
///
/// Admission is open while the network is small: the candidate is registered
/// directly as long as the network would stay below
/// `AIRLINE_CONSENSUS_THRESHOLD` airlines. From the fourth airline on, each
/// call by a funded airline casts one vote and the candidate is admitted at
/// a majority of the registered set.
pub struct GovernanceLedger {
    airlines: HashMap<ActorId, Airline>,
    // Candidate -> voters, in voting order. Consumed on admission.
    votes: HashMap<ActorId, Vec<ActorId>>,
}

impl GovernanceLedger {
    /// Bootstrap the registry with one founding airline, registered but
    /// unfunded. It must deposit the seed fund before it can mutate anything.
    pub fn bootstrap(founding: ActorId) -> Self {
        let mut airlines = HashMap::new();
        airlines.insert(
            founding,
            Airline {
                id: founding,
                registered: true,
                funded: false,
                funded_amount: 0,
                registered_at: current_time(),
            },
        );
        info!("Governance bootstrapped with founding airline {}", founding);
        GovernanceLedger {
            airlines,
            votes: HashMap::new(),
        }
    }

    /// Record a seed-fund deposit for a registered airline. Amounts
    /// accumulate; the funded flag flips on the first qualifying deposit.
    pub fn fund(&mut self, airline: ActorId, amount: u64) -> Result<(), LedgerError> {
        if amount < SEED_FUND {
            return Err(LedgerError::InsufficientFunds {
                provided: amount,
                required: SEED_FUND,
            });
        }
        let record = self
            .airlines
            .get_mut(&airline)
            .ok_or(LedgerError::UnregisteredAirline)?;
        record.funded_amount += amount;
        record.funded = true;
        info!(
            "Airline {} funded with {} (total {})",
            airline, amount, record.funded_amount
        );
        Ok(())
    }

    /// Register a candidate airline, or cast a vote for it once the network
    /// is large enough to require multiparty consensus.
    pub fn register(
        &mut self,
        candidate: ActorId,
        caller: ActorId,
    ) -> Result<RegistrationOutcome, LedgerError> {
        if !self.is_funded(&caller) {
            return Err(LedgerError::NotAuthorized);
        }
        if self.is_airline(&candidate) {
            return Err(LedgerError::AlreadyRegistered);
        }

        let registered = self.registered_count();
        // Admission stays open until the network would reach the consensus
        // threshold; the fourth airline is the first to need votes.
        if registered + 1 < AIRLINE_CONSENSUS_THRESHOLD {
            self.admit(candidate);
            return Ok(RegistrationOutcome::Registered);
        }

        let needed = (registered + 1) / 2;
        let ballot = self.votes.entry(candidate).or_default();
        if ballot.contains(&caller) {
            return Err(LedgerError::DuplicateVote);
        }
        ballot.push(caller);
        let votes = ballot.len();
        debug!(
            "Vote recorded for candidate {}: {}/{} ({} registered airlines)",
            candidate, votes, needed, registered
        );

        if votes >= needed {
            self.votes.remove(&candidate);
            self.admit(candidate);
            Ok(RegistrationOutcome::Registered)
        } else {
            Ok(RegistrationOutcome::VoteRecorded { votes, needed })
        }
    }

    fn admit(&mut self, candidate: ActorId) {
        self.airlines.insert(
            candidate,
            Airline {
                id: candidate,
                registered: true,
                funded: false,
                funded_amount: 0,
                registered_at: current_time(),
            },
        );
        info!(
            "Airline {} registered ({} airlines total)",
            candidate,
            self.airlines.len()
        );
    }

    /// Voters recorded so far for a candidate, in voting order.
    pub fn votes_for(&self, candidate: &ActorId) -> Vec<ActorId> {
        self.votes.get(candidate).cloned().unwrap_or_default()
    }

    pub fn is_airline(&self, id: &ActorId) -> bool {
        self.airlines.get(id).map(|a| a.registered).unwrap_or(false)
    }

    pub fn is_funded(&self, id: &ActorId) -> bool {
        self.airlines.get(id).map(|a| a.funded).unwrap_or(false)
    }

    pub fn registered_count(&self) -> usize {
        self.airlines.values().filter(|a| a.registered).count()
    }

    pub fn get(&self, id: &ActorId) -> Option<&Airline> {
        self.airlines.get(id)
    }
}
