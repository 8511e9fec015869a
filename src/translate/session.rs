//! Session identifiers
//!
//! Emulated temp tables get the session id appended to their names so that
//! concurrent translations do not collide.

use crate::error::{Error, Result};
use rand::Rng;
use std::sync::OnceLock;

/// Number of characters in a session id
pub const SESSION_ID_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random session id: a lowercase letter followed by lowercase alphanumerics
pub fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let mut id = String::with_capacity(SESSION_ID_LENGTH);
    // Some databases reject identifiers starting with a digit
    id.push(ALPHABET[rng.random_range(0..26)] as char);
    for _ in 1..SESSION_ID_LENGTH {
        id.push(ALPHABET[rng.random_range(0..ALPHABET.len())] as char);
    }
    id
}

/// Check a caller-supplied session id
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidSessionId {
        session_id: session_id.to_string(),
        reason,
    };

    let length = session_id.chars().count();
    if length != SESSION_ID_LENGTH {
        return Err(invalid(format!(
            "session ID has length {}, should be {}",
            length, SESSION_ID_LENGTH
        )));
    }
    let mut chars = session_id.chars();
    if !chars.next().is_some_and(|c| c.is_alphabetic()) {
        return Err(invalid("session ID does not start with a letter".to_string()));
    }
    if !chars.all(char::is_alphanumeric) {
        return Err(invalid("illegal character in session ID".to_string()));
    }
    Ok(())
}

/// The session id shared by every translation that does not supply its own
pub fn global_session_id() -> &'static str {
    static GLOBAL: OnceLock<String> = OnceLock::new();
    GLOBAL.get_or_init(generate_session_id)
}
