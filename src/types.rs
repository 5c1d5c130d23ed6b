use serde::{Deserialize, Serialize};

pub const HEADER_REMAINING_MONTH: &str = "x-ratelimit-remaining-month";
pub const HEADER_REMAINING_HOUR: &str = "x-ratelimit-remaining-hour";
pub const HEADER_REMAINING_MINUTE: &str = "x-ratelimit-remaining-minute";

// Rate-limit counters as reported by the backend; header values are kept verbatim.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiCallsRemaining {
    pub month_remaining: String,
    pub hour_remaining: String,
    pub minute_remaining: String,
}

/// One interval of the account's call history: `(datetime, apiCallsCount)`.
pub type ApiCallRecord = (String, u64);
