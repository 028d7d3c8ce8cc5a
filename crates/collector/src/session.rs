//! Session identity — one opaque identifier per engine instance.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SESSION_PREFIX: &str = "session";
const SUFFIX_LEN: usize = 9;

/// Generate a session identifier: fixed prefix, milliseconds since the Unix
/// epoch, and a random alphanumeric suffix. Unique per page load with high
/// probability; never validated against or persisted across loads.
pub fn generate_session_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{SESSION_PREFIX}_{millis}_{suffix}")
}
