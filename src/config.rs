use crate::error::SanError;
use std::env;

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.santiment.net/graphql";

/// Runtime configuration for the Sanbase GraphQL transport.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub graphql_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: 30,
        }
    }
}

fn default_user_agent() -> String {
    format!("sanbase-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - SANBASE_API_KEY (optional; anonymous calls get the free tier)
    /// - SANBASE_GRAPHQL_URL (default: https://api.santiment.net/graphql)
    /// - SANBASE_HTTP_TIMEOUT_SECS (default: 30)
    /// - SANBASE_USER_AGENT (default: sanbase-client/<version>)
    pub fn from_env() -> Result<Self, SanError> {
        let api_key = env::var("SANBASE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let graphql_url =
            env::var("SANBASE_GRAPHQL_URL").unwrap_or_else(|_| DEFAULT_GRAPHQL_URL.to_string());
        url::Url::parse(&graphql_url)
            .map_err(|e| SanError::Config(format!("invalid SANBASE_GRAPHQL_URL: {}", e)))?;
        let timeout_secs = env::var("SANBASE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let user_agent = env::var("SANBASE_USER_AGENT").unwrap_or_else(|_| default_user_agent());

        Ok(Self {
            api_key,
            graphql_url,
            user_agent,
            timeout_secs,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
