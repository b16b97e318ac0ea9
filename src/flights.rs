use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::identity::ActorId;
use crate::utils::current_time;

/// Resolved status of a flight. The numeric codes are part of the oracle
/// wire vocabulary; any code other than `LateAirline` counts as "not late"
/// for insurance payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightStatus {
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    pub fn code(&self) -> u8 {
        match self {
            FlightStatus::Unknown => 0,
            FlightStatus::OnTime => 10,
            FlightStatus::LateAirline => 20,
            FlightStatus::LateWeather => 30,
            FlightStatus::LateTechnical => 40,
            FlightStatus::LateOther => 50,
        }
    }

    pub fn from_code(code: u8) -> Option<FlightStatus> {
        match code {
            0 => Some(FlightStatus::Unknown),
            10 => Some(FlightStatus::OnTime),
            20 => Some(FlightStatus::LateAirline),
            30 => Some(FlightStatus::LateWeather),
            40 => Some(FlightStatus::LateTechnical),
            50 => Some(FlightStatus::LateOther),
            _ => None,
        }
    }

    /// Only a delay attributed to the airline triggers insurance payouts.
    pub fn is_payable(&self) -> bool {
        matches!(self, FlightStatus::LateAirline)
    }
}

/// Identity of a flight: operating airline, flight code and scheduled
/// departure. Immutable once the flight is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: ActorId,
    pub code: String,
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: ActorId, code: &str, timestamp: u64) -> Self {
        FlightKey {
            airline,
            code: code.to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub registered: bool,
    pub status: FlightStatus,
    pub registered_at: u64,
}

/// Registry of known flights. A flight's status mutates exactly once, when
/// oracle consensus finalizes it.
pub struct FlightRegistry {
    flights: HashMap<FlightKey, Flight>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        FlightRegistry {
            flights: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: FlightKey) -> Result<(), LedgerError> {
        if self.flights.contains_key(&key) {
            return Err(LedgerError::DuplicateFlight);
        }
        info!(
            "Flight {} registered by airline {} (departure {})",
            key.code, key.airline, key.timestamp
        );
        self.flights.insert(
            key.clone(),
            Flight {
                key,
                registered: true,
                status: FlightStatus::Unknown,
                registered_at: current_time(),
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, key: &FlightKey) -> bool {
        self.flights.get(key).map(|f| f.registered).unwrap_or(false)
    }

    pub fn status(&self, key: &FlightKey) -> Option<FlightStatus> {
        self.flights.get(key).map(|f| f.status)
    }

    /// Apply a finalized status. Returns `true` if this call performed the
    /// transition, `false` if the flight was already resolved; the first
    /// finalization wins.
    pub fn record_status(
        &mut self,
        key: &FlightKey,
        status: FlightStatus,
    ) -> Result<bool, LedgerError> {
        let flight = self.flights.get_mut(key).ok_or(LedgerError::UnknownFlight)?;
        if flight.status != FlightStatus::Unknown {
            return Ok(false);
        }
        flight.status = status;
        info!(
            "Flight {} resolved with status {:?} (code {})",
            key.code,
            status,
            status.code()
        );
        Ok(true)
    }
}

impl Default for FlightRegistry {
    fn default() -> Self {
        FlightRegistry::new()
    }
}
