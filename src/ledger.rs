use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::errors::LedgerError;
use crate::escrow::InsuranceEscrow;
use crate::flights::{FlightKey, FlightRegistry, FlightStatus};
use crate::governance::{GovernanceLedger, RegistrationOutcome};
use crate::identity::ActorId;
use crate::oracle::{OracleEngine, OracleRequest, QuorumOutcome, ORACLE_INDEX_COUNT};
use crate::treasury::Treasury;

// Capacity of the oracle-request broadcast topic
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// The ledger facade: one writer lock per aggregate, an operational switch
/// gating every mutating call, and an explicit caller identity on each
/// operation in place of any ambient caller context.
///
/// Lock order, where an operation needs more than one aggregate:
/// governance -> flights -> oracles -> escrow -> treasury. Locks are dropped
/// before the next one is taken wherever the logic allows; the finalization
/// path serializes on the flight registry so concurrent quorums for the same
/// flight resolve it exactly once.
pub struct SuretyLedger {
    operator: ActorId,
    operational: AtomicBool,
    governance: RwLock<GovernanceLedger>,
    flights: RwLock<FlightRegistry>,
    escrow: RwLock<InsuranceEscrow>,
    oracles: RwLock<OracleEngine>,
    treasury: RwLock<Treasury>,
    request_tx: broadcast::Sender<OracleRequest>,
}

impl SuretyLedger {
    /// Bootstrap the ledger: founding airline registered but unfunded,
    /// operational switch on. The oracle beacon is derived from the two
    /// bootstrap identities.
    pub fn new(operator: ActorId, founding_airline: ActorId) -> Self {
        let mut beacon = [0u8; 32];
        for (b, (x, y)) in beacon.iter_mut().zip(
            operator
                .as_bytes()
                .iter()
                .zip(founding_airline.as_bytes().iter()),
        ) {
            *b = x ^ y;
        }
        Self::with_beacon(operator, founding_airline, beacon)
    }

    /// Bootstrap with an explicit oracle beacon, for reproducible index
    /// assignment in tests and demos.
    pub fn with_beacon(operator: ActorId, founding_airline: ActorId, beacon: [u8; 32]) -> Self {
        let (request_tx, _) = broadcast::channel(REQUEST_CHANNEL_CAPACITY);
        info!(
            "Ledger bootstrapped: operator {}, founding airline {}",
            operator, founding_airline
        );
        SuretyLedger {
            operator,
            operational: AtomicBool::new(true),
            governance: RwLock::new(GovernanceLedger::bootstrap(founding_airline)),
            flights: RwLock::new(FlightRegistry::new()),
            escrow: RwLock::new(InsuranceEscrow::new()),
            oracles: RwLock::new(OracleEngine::new(beacon)),
            treasury: RwLock::new(Treasury::new()),
            request_tx,
        }
    }

    pub fn operator(&self) -> ActorId {
        self.operator
    }

    /// Subscribe to the oracle-request topic. Every `request_oracle_status`
    /// call broadcasts to all live subscribers.
    pub fn subscribe_requests(&self) -> broadcast::Receiver<OracleRequest> {
        self.request_tx.subscribe()
    }

    // Operational switch

    pub fn is_operational(&self) -> bool {
        self.operational.load(Ordering::SeqCst)
    }

    /// Toggle the global operational switch. Operator only; deliberately not
    /// gated by the switch itself so the operator can always re-enable.
    pub fn set_operating_status(&self, mode: bool, caller: ActorId) -> Result<(), LedgerError> {
        if caller != self.operator {
            return Err(LedgerError::NotAuthorized);
        }
        self.operational.store(mode, Ordering::SeqCst);
        warn!("Operational status set to {}", mode);
        Ok(())
    }

    fn require_operational(&self) -> Result<(), LedgerError> {
        if self.is_operational() {
            Ok(())
        } else {
            Err(LedgerError::NotOperational)
        }
    }

    // Governance operations

    /// Deposit seed funding for the calling airline.
    pub fn fund_airline(&self, caller: ActorId, amount: u64) -> Result<(), LedgerError> {
        self.require_operational()?;
        self.governance.write().fund(caller, amount)?;
        self.treasury.write().deposit(amount);
        Ok(())
    }

    /// Register a candidate airline, possibly by casting a consensus vote.
    pub fn register_airline(
        &self,
        candidate: ActorId,
        caller: ActorId,
    ) -> Result<RegistrationOutcome, LedgerError> {
        self.require_operational()?;
        self.governance.write().register(candidate, caller)
    }

    pub fn get_votes(&self, candidate: &ActorId) -> Vec<ActorId> {
        self.governance.read().votes_for(candidate)
    }

    pub fn is_airline(&self, id: &ActorId) -> bool {
        self.governance.read().is_airline(id)
    }

    pub fn is_airline_funded(&self, id: &ActorId) -> bool {
        self.governance.read().is_funded(id)
    }

    // Flight registry operations

    /// Register a flight operated by the calling airline.
    pub fn register_flight(
        &self,
        airline: ActorId,
        code: &str,
        timestamp: u64,
        caller: ActorId,
    ) -> Result<(), LedgerError> {
        self.require_operational()?;
        if caller != airline {
            return Err(LedgerError::NotAuthorized);
        }
        {
            let governance = self.governance.read();
            if !governance.is_airline(&airline) || !governance.is_funded(&airline) {
                return Err(LedgerError::UnregisteredAirline);
            }
        }
        self.flights
            .write()
            .register(FlightKey::new(airline, code, timestamp))
    }

    pub fn is_flight_registered(&self, airline: ActorId, code: &str, timestamp: u64) -> bool {
        self.flights
            .read()
            .is_registered(&FlightKey::new(airline, code, timestamp))
    }

    pub fn flight_status(&self, airline: ActorId, code: &str, timestamp: u64) -> Option<FlightStatus> {
        self.flights
            .read()
            .status(&FlightKey::new(airline, code, timestamp))
    }

    // Insurance escrow operations

    /// Buy insurance on a registered flight. The premium joins the pool.
    pub fn buy_insurance(
        &self,
        passenger: ActorId,
        airline: ActorId,
        code: &str,
        timestamp: u64,
        value: u64,
    ) -> Result<(), LedgerError> {
        self.require_operational()?;
        let key = FlightKey::new(airline, code, timestamp);
        if !self.flights.read().is_registered(&key) {
            return Err(LedgerError::UnknownFlight);
        }
        self.escrow.write().buy(passenger, key, value)?;
        self.treasury.write().deposit(value);
        Ok(())
    }

    /// Pay out part of a passenger's credited balance. Pull-payment pattern:
    /// only the operator may trigger the transfer, never the payee directly.
    pub fn withdraw(
        &self,
        passenger: ActorId,
        amount: u64,
        caller: ActorId,
    ) -> Result<(), LedgerError> {
        self.require_operational()?;
        if caller != self.operator {
            return Err(LedgerError::NotAuthorized);
        }
        // All checks before any mutation: the escrow debit below cannot fail
        // once both balances have been verified.
        {
            let escrow = self.escrow.read();
            let available = escrow.payout_balance(&passenger);
            if amount > available {
                return Err(LedgerError::InsufficientBalance {
                    requested: amount,
                    available,
                });
            }
        }
        {
            let treasury = self.treasury.read();
            if amount > treasury.balance() {
                return Err(LedgerError::InsufficientFunds {
                    provided: treasury.balance(),
                    required: amount,
                });
            }
        }
        self.escrow.write().withdraw(passenger, amount)?;
        self.treasury.write().withdraw(amount)?;
        Ok(())
    }

    pub fn get_insurance_amount(&self, passenger: &ActorId) -> u64 {
        self.escrow.read().payout_balance(passenger)
    }

    pub fn get_contract_balance(&self) -> u64 {
        self.treasury.read().balance()
    }

    /// Sum of all outstanding payout balances, for reconciliation against
    /// the contract balance.
    pub fn total_payout_liability(&self) -> u64 {
        self.escrow.read().total_liability()
    }

    // Oracle consensus operations

    /// Register the caller as an oracle; the fee joins the pool.
    pub fn register_oracle(
        &self,
        caller: ActorId,
        fee: u64,
    ) -> Result<[u8; ORACLE_INDEX_COUNT], LedgerError> {
        self.require_operational()?;
        let indexes = self.oracles.write().register_oracle(caller, fee)?;
        self.treasury.write().deposit(fee);
        Ok(indexes)
    }

    pub fn get_my_indexes(&self, caller: &ActorId) -> Result<[u8; ORACLE_INDEX_COUNT], LedgerError> {
        self.oracles
            .read()
            .indexes_of(caller)
            .ok_or(LedgerError::NotAuthorized)
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.read().oracle_count()
    }

    /// Open a status query for a flight and broadcast it to subscribed
    /// relays. Quorum detection happens in `submit_oracle_response`; a query
    /// that never reaches quorum simply stays open.
    pub fn request_oracle_status(
        &self,
        airline: ActorId,
        code: &str,
        timestamp: u64,
    ) -> Result<OracleRequest, LedgerError> {
        self.require_operational()?;
        let key = FlightKey::new(airline, code, timestamp);
        if !self.flights.read().is_registered(&key) {
            return Err(LedgerError::UnknownFlight);
        }
        let request = self.oracles.write().open_request(key);
        // No subscribers is fine; the request session is open either way.
        let _ = self.request_tx.send(request.clone());
        Ok(request)
    }

    /// Record an oracle's status report. On the response that completes the
    /// quorum the flight is resolved and, for an airline-caused delay, every
    /// policy on the flight is credited exactly once.
    pub fn submit_oracle_response(
        &self,
        index: u8,
        airline: ActorId,
        code: &str,
        timestamp: u64,
        status: FlightStatus,
        caller: ActorId,
    ) -> Result<(), LedgerError> {
        self.require_operational()?;
        let key = FlightKey::new(airline, code, timestamp);

        let outcome = self
            .oracles
            .write()
            .record_response(index, key.clone(), status, caller)?;
        // The oracle lock is released before touching flights/escrow.

        if let QuorumOutcome::Quorum { status } = outcome {
            let applied = self.flights.write().record_status(&key, status)?;
            if applied && status.is_payable() {
                let credited = self.escrow.write().credit_flight(&key);
                info!(
                    "Flight {} finalized late; credited {} to insurees",
                    key.code, credited
                );
            }
        }
        Ok(())
    }
}
