//! Client for the Santiment (Sanbase) GraphQL API.
//!
//! Requests are expressed either as a `"metric/slug"` dataset identifier or as
//! a metric name plus a slug or selector in [`QueryParams`]. The client picks
//! the query-construction strategy from static tables, executes the document
//! through a [`Transport`] and returns a [`Frame`].
//!
//! ```no_run
//! use sanbase_client::{Client, QueryParams};
//!
//! let client = Client::from_env()?;
//! let frame = client.get(
//!     "daily_active_addresses",
//!     &QueryParams::new()
//!         .slug("bitcoin")
//!         .from_date("2020-01-01")
//!         .to_date("2020-01-10"),
//! )?;
//! println!("{}", frame.to_csv());
//! # Ok::<(), sanbase_client::SanError>(())
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod rate;
pub mod transform;
pub mod types;

pub use client::{Advisory, Client, LogAdvisory};
pub use config::Config;
pub use error::{Result, SanError};
pub use http::{HttpTransport, Transport};
pub use query::{parse_dataset, QueryParams, Selector};
pub use rate::{is_rate_limit_exception, rate_limit_time_left};
pub use transform::Frame;
pub use types::{ApiCallRecord, ApiCallsRemaining};

/// [`Client::get`] with configuration taken from the environment.
pub fn get(dataset: &str, params: &QueryParams) -> Result<Frame> {
    Client::from_env()?.get(dataset, params)
}

/// [`Client::api_calls_remaining`] with configuration taken from the environment.
pub fn api_calls_remaining() -> Result<ApiCallsRemaining> {
    Client::from_env()?.api_calls_remaining()
}

/// [`Client::api_calls_made`] with configuration taken from the environment.
pub fn api_calls_made() -> Result<Vec<ApiCallRecord>> {
    Client::from_env()?.api_calls_made()
}
