mod common;

use aerosure::escrow::INSURANCE_CAP;
use aerosure::flights::FlightStatus;
use aerosure::governance::{RegistrationOutcome, SEED_FUND};
use aerosure::ledger::SuretyLedger;
use aerosure::oracle::ORACLE_INDEX_SPACE;
use aerosure::treasury::UNIT;
use aerosure::LedgerError;

use common::{airline, funded_ledger, operator, passenger, quorum_responders, TEST_BEACON};

const DEPARTURE: u64 = 1_900_000_000;

#[test]
fn operational_switch_gates_all_mutations() {
    let ledger = funded_ledger();
    assert!(ledger.is_operational());

    // Only the contract operator may flip the switch.
    assert_eq!(
        ledger.set_operating_status(false, airline(0)).unwrap_err(),
        LedgerError::NotAuthorized
    );
    assert!(ledger.is_operational());

    ledger.set_operating_status(false, operator()).unwrap();
    assert_eq!(
        ledger.register_airline(airline(1), airline(0)).unwrap_err(),
        LedgerError::NotOperational
    );
    assert_eq!(
        ledger
            .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
            .unwrap_err(),
        LedgerError::NotOperational
    );
    assert_eq!(
        ledger
            .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, UNIT)
            .unwrap_err(),
        LedgerError::NotOperational
    );

    // Set it back for the rest of the system to work.
    ledger.set_operating_status(true, operator()).unwrap();
    ledger.register_airline(airline(1), airline(0)).unwrap();
    assert!(ledger.is_airline(&airline(1)));
}

#[test]
fn governance_multiparty_scenario() {
    let ledger = funded_ledger();

    // Registered but unfunded airlines cannot admit anyone.
    let unfunded = SuretyLedger::with_beacon(operator(), airline(0), TEST_BEACON);
    assert_eq!(
        unfunded.register_airline(airline(1), airline(0)).unwrap_err(),
        LedgerError::NotAuthorized
    );

    // Below the consensus threshold admission is immediate.
    assert_eq!(
        ledger.register_airline(airline(1), airline(0)).unwrap(),
        RegistrationOutcome::Registered
    );
    assert_eq!(
        ledger.register_airline(airline(2), airline(0)).unwrap(),
        RegistrationOutcome::Registered
    );
    assert!(ledger.is_airline(&airline(1)));

    // Re-registration is rejected.
    assert_eq!(
        ledger.register_airline(airline(1), airline(0)).unwrap_err(),
        LedgerError::AlreadyRegistered
    );

    // The fourth airline needs ceil(3/2) = 2 votes.
    assert_eq!(
        ledger.register_airline(airline(3), airline(0)).unwrap(),
        RegistrationOutcome::VoteRecorded { votes: 1, needed: 2 }
    );
    assert!(!ledger.is_airline(&airline(3)));
    assert_eq!(ledger.get_votes(&airline(3)), vec![airline(0)]);

    // An unfunded airline cannot vote; a funded one cannot vote twice.
    assert_eq!(
        ledger.register_airline(airline(3), airline(1)).unwrap_err(),
        LedgerError::NotAuthorized
    );
    assert_eq!(
        ledger.register_airline(airline(3), airline(0)).unwrap_err(),
        LedgerError::DuplicateVote
    );

    // A second funded voter completes the majority.
    ledger.fund_airline(airline(1), SEED_FUND).unwrap();
    assert_eq!(
        ledger.register_airline(airline(3), airline(1)).unwrap(),
        RegistrationOutcome::Registered
    );
    assert!(ledger.is_airline(&airline(3)));
    assert!(ledger.get_votes(&airline(3)).is_empty());
}

#[test]
fn seed_funding_is_enforced_and_pools() {
    let ledger = funded_ledger();
    assert_eq!(ledger.get_contract_balance(), SEED_FUND);

    assert_eq!(
        ledger.fund_airline(airline(0), SEED_FUND - 1).unwrap_err(),
        LedgerError::InsufficientFunds {
            provided: SEED_FUND - 1,
            required: SEED_FUND
        }
    );
    // Nothing reached the pool on rejection.
    assert_eq!(ledger.get_contract_balance(), SEED_FUND);
}

#[test]
fn flight_registry_scenario() {
    let ledger = funded_ledger();
    ledger
        .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
        .unwrap();
    assert!(ledger.is_flight_registered(airline(0), "NYC", DEPARTURE));

    assert_eq!(
        ledger
            .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
            .unwrap_err(),
        LedgerError::DuplicateFlight
    );

    // airline(1) is not registered at all.
    assert_eq!(
        ledger
            .register_flight(airline(1), "LHR", DEPARTURE, airline(1))
            .unwrap_err(),
        LedgerError::UnregisteredAirline
    );
    assert!(!ledger.is_flight_registered(airline(1), "LHR", DEPARTURE));
}

#[test]
fn insurance_purchase_guards() {
    let ledger = funded_ledger();
    ledger
        .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
        .unwrap();

    assert_eq!(
        ledger
            .buy_insurance(passenger(0), airline(0), "LHR", DEPARTURE, UNIT)
            .unwrap_err(),
        LedgerError::UnknownFlight
    );
    assert_eq!(
        ledger
            .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, 0)
            .unwrap_err(),
        LedgerError::InvalidPremium { value: 0 }
    );
    assert_eq!(
        ledger
            .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, INSURANCE_CAP + 1)
            .unwrap_err(),
        LedgerError::InvalidPremium {
            value: INSURANCE_CAP + 1
        }
    );

    ledger
        .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, UNIT)
        .unwrap();

    // Open question resolved as reject-on-duplicate rather than top-up.
    assert_eq!(
        ledger
            .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, UNIT / 2)
            .unwrap_err(),
        LedgerError::DuplicatePolicy
    );
}

#[test]
fn late_finalization_credits_and_pays_out() {
    let ledger = funded_ledger();
    ledger
        .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
        .unwrap();
    ledger
        .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, UNIT)
        .unwrap();
    assert_eq!(ledger.get_insurance_amount(&passenger(0)), 0);

    let request = ledger
        .request_oracle_status(airline(0), "NYC", DEPARTURE)
        .unwrap();
    // One more holder than the quorum needs, registered up front so the
    // balance snapshot below stays stable.
    let mut holders = common::oracles_holding(&ledger, request.index, 4);
    let extra = holders.pop().unwrap();
    let balance_before_quorum = ledger.get_contract_balance();

    for responder in &holders {
        ledger
            .submit_oracle_response(
                request.index,
                airline(0),
                "NYC",
                DEPARTURE,
                FlightStatus::LateAirline,
                *responder,
            )
            .unwrap();
    }

    assert_eq!(
        ledger.flight_status(airline(0), "NYC", DEPARTURE),
        Some(FlightStatus::LateAirline)
    );
    let expected = UNIT * 3 / 2;
    assert_eq!(ledger.get_insurance_amount(&passenger(0)), expected);
    // Crediting moves liability, not value.
    assert_eq!(ledger.get_contract_balance(), balance_before_quorum);

    // Responses after finalization are bookkeeping only: no double credit.
    ledger
        .submit_oracle_response(
            request.index,
            airline(0),
            "NYC",
            DEPARTURE,
            FlightStatus::LateAirline,
            extra,
        )
        .unwrap();
    assert_eq!(ledger.get_insurance_amount(&passenger(0)), expected);

    // Pull payment: operator-mediated withdrawal down to zero.
    assert_eq!(
        ledger.withdraw(passenger(0), expected, passenger(0)).unwrap_err(),
        LedgerError::NotAuthorized
    );
    ledger.withdraw(passenger(0), expected, operator()).unwrap();
    assert_eq!(ledger.get_insurance_amount(&passenger(0)), 0);
    assert_eq!(
        ledger.get_contract_balance(),
        balance_before_quorum - expected
    );
}

#[test]
fn on_time_finalization_credits_nothing() {
    let ledger = funded_ledger();
    ledger
        .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
        .unwrap();
    ledger
        .buy_insurance(passenger(0), airline(0), "NYC", DEPARTURE, UNIT)
        .unwrap();

    let request = ledger
        .request_oracle_status(airline(0), "NYC", DEPARTURE)
        .unwrap();
    for responder in quorum_responders(&ledger, request.index) {
        ledger
            .submit_oracle_response(
                request.index,
                airline(0),
                "NYC",
                DEPARTURE,
                FlightStatus::OnTime,
                responder,
            )
            .unwrap();
    }

    assert_eq!(
        ledger.flight_status(airline(0), "NYC", DEPARTURE),
        Some(FlightStatus::OnTime)
    );
    assert_eq!(ledger.get_insurance_amount(&passenger(0)), 0);
    assert_eq!(
        ledger.withdraw(passenger(0), 1, operator()).unwrap_err(),
        LedgerError::InsufficientBalance {
            requested: 1,
            available: 0
        }
    );
}

#[test]
fn oracle_response_guards() {
    let ledger = funded_ledger();
    ledger
        .register_flight(airline(0), "NYC", DEPARTURE, airline(0))
        .unwrap();
    let request = ledger
        .request_oracle_status(airline(0), "NYC", DEPARTURE)
        .unwrap();

    let responder = quorum_responders(&ledger, request.index)[0];
    let indexes = ledger.get_my_indexes(&responder).unwrap();
    let foreign = (0..ORACLE_INDEX_SPACE)
        .find(|i| !indexes.contains(i))
        .unwrap();

    // An index outside the caller's assignment is rejected outright.
    assert_eq!(
        ledger
            .submit_oracle_response(
                foreign,
                airline(0),
                "NYC",
                DEPARTURE,
                FlightStatus::OnTime,
                responder
            )
            .unwrap_err(),
        LedgerError::IndexMismatch { index: foreign }
    );

    // Unregistered reporters have no indexes at all.
    assert_eq!(
        ledger
            .submit_oracle_response(
                request.index,
                airline(0),
                "NYC",
                DEPARTURE,
                FlightStatus::OnTime,
                passenger(0)
            )
            .unwrap_err(),
        LedgerError::IndexMismatch {
            index: request.index
        }
    );
    assert_eq!(
        ledger.get_my_indexes(&passenger(0)).unwrap_err(),
        LedgerError::NotAuthorized
    );
}
