use std::sync::Arc;

use aerosure::governance::SEED_FUND;
use aerosure::identity::ActorId;
use aerosure::ledger::SuretyLedger;
use aerosure::oracle::{MIN_ORACLE_RESPONSES, ORACLE_REGISTRATION_FEE};

pub const TEST_BEACON: [u8; 32] = [7u8; 32];

pub fn operator() -> ActorId {
    ActorId::from_seed("operator")
}

pub fn airline(n: usize) -> ActorId {
    ActorId::from_seed(&format!("airline-{}", n))
}

pub fn passenger(n: usize) -> ActorId {
    ActorId::from_seed(&format!("passenger-{}", n))
}

/// Ledger with a funded founding airline, ready for writes.
pub fn funded_ledger() -> Arc<SuretyLedger> {
    let ledger = Arc::new(SuretyLedger::with_beacon(operator(), airline(0), TEST_BEACON));
    ledger.fund_airline(airline(0), SEED_FUND).unwrap();
    ledger
}

/// Register fresh oracles with the ledger until `want` of them hold the
/// given index, and return those holders.
pub fn oracles_holding(ledger: &SuretyLedger, index: u8, want: usize) -> Vec<ActorId> {
    let mut holders = Vec::new();
    let mut n = 0;
    while holders.len() < want {
        let id = ActorId::from_seed(&format!("quorum-oracle-{}", n));
        n += 1;
        let indexes = match ledger.register_oracle(id, ORACLE_REGISTRATION_FEE) {
            Ok(indexes) => indexes,
            // Already registered by an earlier helper call in the same test.
            Err(_) => ledger.get_my_indexes(&id).unwrap(),
        };
        if indexes.contains(&index) {
            holders.push(id);
        }
    }
    holders
}

/// Enough responders for one quorum.
pub fn quorum_responders(ledger: &SuretyLedger, index: u8) -> Vec<ActorId> {
    oracles_holding(ledger, index, MIN_ORACLE_RESPONSES)
}
