//! Rate-limit helpers. The backend reports limits only in error text, so
//! both functions work on the rendered message.

use std::fmt::Display;

pub const RATE_LIMIT_MARKER: &str = "API Rate Limit Reached";

pub fn is_rate_limit_exception<E: Display + ?Sized>(err: &E) -> bool {
    err.to_string().contains(RATE_LIMIT_MARKER)
}

/// Seconds to wait, taken from the first purely numeric word of a message like
/// `API Rate Limit Reached. Try again in 30 seconds (30 seconds)`.
pub fn rate_limit_time_left<E: Display + ?Sized>(err: &E) -> Option<u64> {
    err.to_string()
        .split_whitespace()
        .find(|w| w.chars().all(|c| c.is_ascii_digit()))
        .and_then(|w| w.parse().ok())
}
