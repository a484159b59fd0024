//! Short base36 identifiers for sessions, users, and drawing actions.
//!
//! Session ids double as the join capability, so they stay short enough to
//! paste into an invite link. User and action ids append a millisecond
//! timestamp in base36 to keep collisions across clients unlikely.

#[cfg(test)]
#[path = "ids_test.rs"]
mod tests;

use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a session id.
pub const SESSION_ID_LEN: usize = 7;

/// Generate an opaque session id: 7 random base36 characters.
#[must_use]
pub fn session_id() -> String {
    random_base36(SESSION_ID_LEN)
}

/// Generate a user id: 7 random base36 characters plus the current time in
/// milliseconds rendered in base36.
#[must_use]
pub fn user_id() -> String {
    let mut id = random_base36(SESSION_ID_LEN);
    id.push_str(&to_base36(crate::now_ms().unsigned_abs()));
    id
}

/// Generate a drawing-action id. Same shape as a user id.
#[must_use]
pub fn action_id() -> String {
    user_id()
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
