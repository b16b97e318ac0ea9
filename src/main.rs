use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use clap::Parser;
use log::info;
use serde_json::json;

use aerosure::governance::SEED_FUND;
use aerosure::identity::ActorId;
use aerosure::ledger::SuretyLedger;
use aerosure::relay::OracleRelay;
use aerosure::treasury::UNIT;
use aerosure::utils::current_time;
use aerosure::{FlightStatus, RegistrationOutcome};

/// Flight-delay insurance ledger demo node: boots the ledger, spawns the
/// oracle relay, and walks the full lifecycle from airline admission to
/// passenger payout.
#[derive(Parser, Debug)]
#[command(name = "aerosure-node", version, about)]
struct Args {
    /// Number of oracles the relay registers
    #[arg(long, default_value_t = 20)]
    oracles: usize,

    /// Number of passengers buying insurance on the demo flight
    #[arg(long, default_value_t = 3)]
    passengers: usize,

    /// Seconds to wait for oracle consensus before giving up
    #[arg(long, default_value_t = 10)]
    consensus_timeout: u64,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let operator = ActorId::from_seed("operator");
    let founding = ActorId::from_seed("airline-alpha");
    let ledger = Arc::new(SuretyLedger::new(operator, founding));

    // The relay subscribes before any request can be broadcast.
    let requests = ledger.subscribe_requests();
    let relay = OracleRelay::register_fleet(Arc::clone(&ledger), args.oracles, "oracle")
        .expect("oracle fleet registration");
    let _relay_task = relay.spawn(requests);

    run_scenario(&ledger, operator, founding, &args).await;
}

async fn run_scenario(ledger: &Arc<SuretyLedger>, operator: ActorId, founding: ActorId, args: &Args) {
    info!("Funding founding airline");
    ledger
        .fund_airline(founding, SEED_FUND)
        .expect("seed funding");

    // Two more airlines join directly; the fourth needs votes.
    let bravo = ActorId::from_seed("airline-bravo");
    let charlie = ActorId::from_seed("airline-charlie");
    let delta = ActorId::from_seed("airline-delta");
    ledger.register_airline(bravo, founding).expect("register bravo");
    ledger.register_airline(charlie, founding).expect("register charlie");

    match ledger.register_airline(delta, founding).expect("vote for delta") {
        RegistrationOutcome::VoteRecorded { votes, needed } => {
            info!("Delta admission pending: {}/{} votes", votes, needed);
        }
        RegistrationOutcome::Registered => unreachable!("fourth airline requires votes"),
    }
    ledger.fund_airline(bravo, SEED_FUND).expect("fund bravo");
    ledger.register_airline(delta, bravo).expect("second vote for delta");
    info!("Delta admitted with multiparty consensus: {}", ledger.is_airline(&delta));

    // A flight that already departed, so the relay will report it late.
    let departure = current_time() - 3_600;
    let code = "AS-107";
    ledger
        .register_flight(founding, code, departure, founding)
        .expect("flight registration");
    info!(
        "Registered flight {} departing {}",
        code,
        Utc.timestamp_opt(departure as i64, 0).unwrap()
    );

    let passengers: Vec<ActorId> = (0..args.passengers)
        .map(|n| ActorId::from_seed(&format!("passenger-{}", n)))
        .collect();
    for passenger in &passengers {
        ledger
            .buy_insurance(*passenger, founding, code, departure, UNIT)
            .expect("insurance purchase");
    }

    // Wait for the relay to push a session over quorum. If the drawn index
    // has too few holders in the fleet, re-request: a fresh request draws a
    // fresh index. Retry policy belongs out here, not in the ledger.
    let deadline = current_time() + args.consensus_timeout;
    'consensus: loop {
        let request = ledger
            .request_oracle_status(founding, code, departure)
            .expect("status request");
        info!("Requested oracle status under index {}", request.index);

        let attempt_deadline = (current_time() + 2).min(deadline);
        loop {
            match ledger.flight_status(founding, code, departure) {
                Some(FlightStatus::Unknown) | None => {
                    if current_time() >= attempt_deadline {
                        if current_time() >= deadline {
                            eprintln!("No oracle consensus within {}s", args.consensus_timeout);
                            return;
                        }
                        continue 'consensus;
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                Some(status) => {
                    info!("Flight {} resolved: {:?}", code, status);
                    break 'consensus;
                }
            }
        }
    }

    for passenger in &passengers {
        let credited = ledger.get_insurance_amount(passenger);
        if credited > 0 {
            ledger
                .withdraw(*passenger, credited, operator)
                .expect("withdrawal");
            info!("Passenger {} paid out {}", passenger, credited);
        }
    }

    let summary = json!({
        "airlines": {
            "registered": [founding.to_string(), bravo.to_string(), charlie.to_string(), delta.to_string()],
        },
        "flight": {
            "code": code,
            "departure": departure,
            "status": format!("{:?}", ledger.flight_status(founding, code, departure).unwrap()),
        },
        "contract_balance": ledger.get_contract_balance(),
        "outstanding_liability": ledger.total_payout_liability(),
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}
