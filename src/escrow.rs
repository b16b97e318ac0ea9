use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::flights::FlightKey;
use crate::identity::ActorId;
use crate::treasury::UNIT;
use crate::utils::current_time;

// Constants for insurance accounting
pub const INSURANCE_CAP: u64 = UNIT; // Maximum premium per policy
pub const PAYOUT_NUMERATOR: u64 = 3; // Payout is premium * 3 / 2 (1.5x)
pub const PAYOUT_DENOMINATOR: u64 = 2;

/// One passenger's policy on one flight. `credited` guards the policy
/// against double payout across repeated finalization attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub passenger: ActorId,
    pub premium: u64,
    pub credited: bool,
    pub purchased_at: u64,
}

/// Escrow holding insurance policies and per-passenger payout balances.
/// Balances grow only through crediting and shrink only through withdrawal;
/// the pooled value itself lives in the treasury.
pub struct InsuranceEscrow {
    policies: HashMap<FlightKey, Vec<InsurancePolicy>>,
    payouts: HashMap<ActorId, u64>,
}

impl InsuranceEscrow {
    pub fn new() -> Self {
        InsuranceEscrow {
            policies: HashMap::new(),
            payouts: HashMap::new(),
        }
    }

    /// Record a policy purchase. One policy per passenger per flight.
    pub fn buy(
        &mut self,
        passenger: ActorId,
        flight: FlightKey,
        value: u64,
    ) -> Result<(), LedgerError> {
        if value == 0 || value > INSURANCE_CAP {
            return Err(LedgerError::InvalidPremium { value });
        }
        let holders = self.policies.entry(flight.clone()).or_default();
        if holders.iter().any(|p| p.passenger == passenger) {
            return Err(LedgerError::DuplicatePolicy);
        }
        holders.push(InsurancePolicy {
            passenger,
            premium: value,
            credited: false,
            purchased_at: current_time(),
        });
        info!(
            "Passenger {} insured flight {} for {}",
            passenger, flight.code, value
        );
        Ok(())
    }

    /// Credit every uncredited policy on a flight with 1.5x its premium.
    /// Returns the total amount credited. Safe to call again for the same
    /// flight: already-credited policies are skipped.
    pub fn credit_flight(&mut self, flight: &FlightKey) -> u64 {
        let mut total = 0;
        if let Some(holders) = self.policies.get_mut(flight) {
            for policy in holders.iter_mut().filter(|p| !p.credited) {
                let payout = policy.premium * PAYOUT_NUMERATOR / PAYOUT_DENOMINATOR;
                *self.payouts.entry(policy.passenger).or_insert(0) += payout;
                policy.credited = true;
                total += payout;
                debug!(
                    "Credited passenger {} with {} for flight {}",
                    policy.passenger, payout, flight.code
                );
            }
        }
        if total > 0 {
            info!("Credited {} across insurees of flight {}", total, flight.code);
        }
        total
    }

    /// Debit a passenger's payout balance. The caller settles the actual
    /// value transfer against the treasury.
    pub fn withdraw(&mut self, passenger: ActorId, amount: u64) -> Result<(), LedgerError> {
        let available = self.payout_balance(&passenger);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        *self.payouts.entry(passenger).or_insert(0) -= amount;
        info!("Passenger {} withdrew {}", passenger, amount);
        Ok(())
    }

    pub fn payout_balance(&self, passenger: &ActorId) -> u64 {
        self.payouts.get(passenger).copied().unwrap_or(0)
    }

    /// Sum of all outstanding payout balances, for reconciliation.
    pub fn total_liability(&self) -> u64 {
        self.payouts.values().sum()
    }

    pub fn policy(&self, flight: &FlightKey, passenger: &ActorId) -> Option<&InsurancePolicy> {
        self.policies
            .get(flight)
            .and_then(|holders| holders.iter().find(|p| &p.passenger == passenger))
    }
}

impl Default for InsuranceEscrow {
    fn default() -> Self {
        InsuranceEscrow::new()
    }
}
