use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current time in seconds since the Unix epoch
pub fn current_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Whether a flight's scheduled departure lies in the past. The relay uses
/// this to decide between an on-time and a late status report.
pub fn departure_has_passed(departure: u64) -> bool {
    departure < current_time()
}
