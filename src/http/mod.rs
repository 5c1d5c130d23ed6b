use crate::config::Config;
use crate::error::{Result, SanError};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Substring the backend puts in errors for a successful call with no data.
pub const EMPTY_RESULT_MARKER: &str = "the results are empty";

/// Executes query documents against the backend.
///
/// `execute` returns the `data` object of the response. `response_headers`
/// returns the response headers with lower-cased names. Failures are reported
/// as [`SanError::Transport`] with the backend's text preserved so callers can
/// sniff it for rate-limit and empty-result conditions.
pub trait Transport {
    fn execute(&self, query: &str) -> Result<Value>;
    fn response_headers(&self, query: &str) -> Result<HashMap<String, String>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<Value>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

pub fn build_client(cfg: &Config) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|e| SanError::Config(format!("invalid user agent: {}", e)))?;
    default_headers.insert(USER_AGENT, ua);
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(|e| SanError::Config(e.to_string()))
}

fn auth_header(api_key: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Apikey {}", api_key))
        .map_err(|e| SanError::Config(format!("invalid API key: {}", e)))
}

/// Blocking GraphQL transport over reqwest; each call runs to completion on a
/// private current-thread runtime.
pub struct HttpTransport {
    cfg: Config,
    client: Client,
    rt: tokio::runtime::Runtime,
}

impl HttpTransport {
    pub fn new(cfg: Config) -> Result<Self> {
        let client = build_client(&cfg)?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SanError::Config(format!("failed to start runtime: {}", e)))?;
        Ok(Self { cfg, client, rt })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn post(&self, query: &str) -> Result<(StatusCode, HeaderMap, String)> {
        let mut req = self
            .client
            .post(&self.cfg.graphql_url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&serde_json::json!({ "query": query }));
        if let Some(key) = &self.cfg.api_key {
            req = req.header(AUTHORIZATION, auth_header(key)?);
        }
        debug!("POST {} query={}", self.cfg.graphql_url, query);
        self.rt.block_on(async move {
            let res = req.send().await.map_err(|e| {
                warn!("GraphQL request failed: {}", e);
                SanError::transport(format!("Error running query. ({})", e))
            })?;
            let status = res.status();
            let headers = res.headers().clone();
            let text = res.text().await.map_err(|e| {
                warn!("failed to read GraphQL response body: {}", e);
                SanError::transport(format!(
                    "Error running query, failed to read response (status {}). ({})",
                    status.as_u16(),
                    e
                ))
            })?;
            Ok::<_, SanError>((status, headers, text))
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, query: &str) -> Result<Value> {
        let (status, _headers, text) = self.post(query)?;
        interpret_response(status, &text, query)
    }

    fn response_headers(&self, query: &str) -> Result<HashMap<String, String>> {
        let (status, headers, text) = self.post(query)?;
        if !status.is_success() {
            return Err(status_error(status, &text, query));
        }
        Ok(header_map(&headers))
    }
}

/// Flatten a reqwest header map; names are already lower-case there.
pub fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|s| (k.as_str().to_ascii_lowercase(), s.to_string()))
        })
        .collect()
}

fn joined_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

fn has_results(data: &Value) -> bool {
    match data {
        Value::Object(map) => map.values().any(|v| match v {
            Value::Null => false,
            Value::Array(a) => !a.is_empty(),
            _ => true,
        }),
        Value::Null => false,
        _ => true,
    }
}

/// Error for a non-2xx response. Backend text comes before the query so the
/// rate-limit helpers find its wait time first.
pub fn status_error(status: StatusCode, text: &str, query: &str) -> SanError {
    let parsed: Option<GraphQlResponse> = serde_json::from_str(text).ok();
    let details = match parsed.as_ref().and_then(|p| p.errors.as_deref()) {
        Some(errors) if !errors.is_empty() => joined_messages(errors),
        _ => text.trim().to_string(),
    };
    warn!("GraphQL request returned status {}", status);
    SanError::transport(format!(
        "Error running query. Status code: {}.\n {}\n {}",
        status.as_u16(),
        details,
        query
    ))
}

/// Map a raw HTTP outcome onto the `data` object or a transport error.
pub fn interpret_response(status: StatusCode, text: &str, query: &str) -> Result<Value> {
    if !status.is_success() {
        return Err(status_error(status, text, query));
    }
    let parsed: Option<GraphQlResponse> = serde_json::from_str(text).ok();

    let resp = parsed.ok_or_else(|| {
        SanError::transport(format!("Error running query, invalid JSON response. Query: {}", query))
    })?;
    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        return Err(SanError::transport(format!(
            "GraphQL error occured running query. Errors: {}\n Query: {}",
            joined_messages(&errors),
            query
        )));
    }
    match resp.data {
        Some(data) if has_results(&data) => Ok(data),
        _ => Err(SanError::transport(format!(
            "Error running query, {}. Query: {}",
            EMPTY_RESULT_MARKER, query
        ))),
    }
}
