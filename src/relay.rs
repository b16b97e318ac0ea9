use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::errors::LedgerError;
use crate::flights::FlightStatus;
use crate::identity::ActorId;
use crate::ledger::SuretyLedger;
use crate::oracle::{OracleRequest, ORACLE_INDEX_COUNT, ORACLE_REGISTRATION_FEE};
use crate::utils::departure_has_passed;

pub const DEFAULT_FLEET_SIZE: usize = 20;

/// Event-forwarding service for oracle consensus: owns a fleet of registered
/// oracles, consumes broadcast requests, and submits one response per
/// matching oracle. The status it reports is simulated from the flight's
/// scheduled departure: a departure already in the past is reported as an
/// airline-caused delay, anything else as on time.
///
/// Timeout and retry policy for queries that never reach quorum lives here
/// by design; the ledger itself keeps unresolved sessions open forever.
pub struct OracleRelay {
    ledger: Arc<SuretyLedger>,
    fleet: Vec<(ActorId, [u8; ORACLE_INDEX_COUNT])>,
}

impl OracleRelay {
    /// Register `size` oracles with the ledger and return the relay that
    /// drives them.
    pub fn register_fleet(
        ledger: Arc<SuretyLedger>,
        size: usize,
        seed_prefix: &str,
    ) -> Result<Self, LedgerError> {
        let mut fleet = Vec::with_capacity(size);
        for n in 0..size {
            let id = ActorId::from_seed(&format!("{}-{}", seed_prefix, n));
            let indexes = ledger.register_oracle(id, ORACLE_REGISTRATION_FEE)?;
            debug!("Relay oracle {} holds indexes {:?}", id, indexes);
            fleet.push((id, indexes));
        }
        info!("Relay fleet of {} oracles registered", fleet.len());
        Ok(OracleRelay { ledger, fleet })
    }

    pub fn fleet_size(&self) -> usize {
        self.fleet.len()
    }

    pub fn oracle_ids(&self) -> Vec<ActorId> {
        self.fleet.iter().map(|(id, _)| *id).collect()
    }

    /// Answer one request with every fleet oracle holding the requested
    /// index. Rejections (e.g. a session finalized mid-loop) are expected
    /// and logged, never propagated.
    pub fn answer(&self, request: &OracleRequest) {
        let status = if departure_has_passed(request.timestamp) {
            FlightStatus::LateAirline
        } else {
            FlightStatus::OnTime
        };
        info!(
            "Relay answering request for flight {} (index {}) with {:?}",
            request.code, request.index, status
        );

        for (id, indexes) in &self.fleet {
            if !indexes.contains(&request.index) {
                continue;
            }
            match self.ledger.submit_oracle_response(
                request.index,
                request.airline,
                &request.code,
                request.timestamp,
                status,
                *id,
            ) {
                Ok(()) => debug!("Oracle {} response accepted", id),
                Err(err) => debug!("Oracle {} response rejected: {}", id, err),
            }
        }
    }

    /// Consume the request topic until the ledger is dropped.
    pub async fn run(self, mut requests: broadcast::Receiver<OracleRequest>) {
        loop {
            match requests.recv().await {
                Ok(request) => self.answer(&request),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Relay lagged behind the request topic, missed {}", missed);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Request topic closed; relay shutting down");
                    break;
                }
            }
        }
    }

    /// Spawn the relay loop on the current tokio runtime.
    pub fn spawn(self, requests: broadcast::Receiver<OracleRequest>) -> JoinHandle<()> {
        tokio::spawn(self.run(requests))
    }
}
