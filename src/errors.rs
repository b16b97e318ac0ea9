use thiserror::Error;

/// Rejection taxonomy for every mutating ledger operation. Each call performs
/// all of its precondition checks before touching state, so a returned error
/// always means the ledger is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Contract is not operational")]
    NotOperational,

    #[error("Caller is not authorized for this operation")]
    NotAuthorized,

    #[error("Participant is already registered")]
    AlreadyRegistered,

    #[error("Caller has already voted for this candidate")]
    DuplicateVote,

    #[error("Airline is not registered or not funded")]
    UnregisteredAirline,

    #[error("Flight is already registered")]
    DuplicateFlight,

    #[error("Flight is not registered")]
    UnknownFlight,

    #[error("Invalid insurance premium: {value}")]
    InvalidPremium { value: u64 },

    #[error("Passenger already holds a policy for this flight")]
    DuplicatePolicy,

    #[error("Insufficient funds: provided {provided}, required {required}")]
    InsufficientFunds { provided: u64, required: u64 },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Index {index} is not assigned to the responding oracle")]
    IndexMismatch { index: u8 },

    #[error("No open oracle request matches the response")]
    UnknownRequest,
}
