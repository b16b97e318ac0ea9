pub mod errors;
pub mod escrow;
pub mod flights;
pub mod governance;
pub mod identity;
pub mod ledger;
pub mod oracle;
pub mod relay;
pub mod treasury;
pub mod utils;

// Re-export commonly used items
pub use errors::LedgerError;
pub use escrow::{InsurancePolicy, INSURANCE_CAP};
pub use flights::{Flight, FlightKey, FlightStatus};
pub use governance::{Airline, RegistrationOutcome, AIRLINE_CONSENSUS_THRESHOLD, SEED_FUND};
pub use identity::ActorId;
pub use ledger::SuretyLedger;
pub use oracle::{
    OracleRequest, QuorumOutcome, SessionStatus, MIN_ORACLE_RESPONSES, ORACLE_REGISTRATION_FEE,
};
pub use relay::OracleRelay;
pub use treasury::UNIT;
