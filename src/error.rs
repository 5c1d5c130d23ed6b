use thiserror::Error;

/// Every failure surfaced by the client.
///
/// The backend has no structured error codes, so each variant carries the
/// message a caller would see and the rate-limit helpers in [`crate::rate`]
/// work off the rendered text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanError {
    #[error("Invalid metric!")]
    InvalidMetric,

    #[error(
        "Invalid call of the get function, you need to either give <metric>/<slug> \
         as a first argument or give a slug or selector as a key-word argument!"
    )]
    InvalidCall,

    #[error("invalid query parameters: {0}")]
    InvalidParams(String),

    #[error("No API Key detected...")]
    NoCredential,

    #[error("{0}")]
    Transport(String),

    #[error("There are no limits for this API Key.")]
    NoRateLimits,

    #[error("An error has occured, please contact our support...")]
    UnexpectedResponse,

    #[error("configuration error: {0}")]
    Config(String),
}

impl SanError {
    pub fn transport(msg: impl Into<String>) -> Self {
        SanError::Transport(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SanError>;
