use crate::catalog::{self, Strategy};
use crate::config::Config;
use crate::error::{Result, SanError};
use crate::http::{HttpTransport, Transport, EMPTY_RESULT_MARKER};
use crate::query::{self, QueryParams};
use crate::transform::{transform_query_result, Frame};
use crate::types::{
    ApiCallRecord, ApiCallsRemaining, HEADER_REMAINING_HOUR, HEADER_REMAINING_MINUTE,
    HEADER_REMAINING_MONTH,
};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

/// Receives the advisory emitted when a deprecated metric is requested.
pub trait Advisory {
    fn deprecated(&self, metric: &str, replacement: &str);
}

/// Default advisory: a `warn!` event on the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAdvisory;

impl Advisory for LogAdvisory {
    fn deprecated(&self, metric: &str, replacement: &str) {
        warn!(
            "**NOTICE** {} will be deprecated in version 0.9.0, please use {} instead",
            metric, replacement
        );
    }
}

impl<F: Fn(&str, &str)> Advisory for F {
    fn deprecated(&self, metric: &str, replacement: &str) {
        self(metric, replacement)
    }
}

pub struct Client<T: Transport = HttpTransport> {
    transport: T,
    advisory: Box<dyn Advisory>,
}

impl Client<HttpTransport> {
    pub fn new(cfg: Config) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(cfg)?))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            advisory: Box::new(LogAdvisory),
        }
    }

    pub fn with_advisory(mut self, advisory: impl Advisory + 'static) -> Self {
        self.advisory = Box::new(advisory);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a metric as a frame.
    ///
    /// `dataset` is either `"metric/slug"` or a bare metric name. A bare name
    /// needs `params.slug` or `params.selector` unless it is one of the
    /// global metrics that take no slug.
    pub fn get(&self, dataset: &str, params: &QueryParams) -> Result<Frame> {
        params.validate()?;
        let (metric, slug) = query::parse_dataset(dataset);
        if metric.is_empty() {
            return Err(SanError::InvalidMetric);
        }
        if !slug.is_empty() || catalog::is_no_slug(metric) {
            self.get_by_slug_string(metric, slug, dataset, params)
        } else {
            self.get_by_selector(metric, params)
        }
    }

    fn get_by_slug_string(
        &self,
        metric: &str,
        slug: &str,
        dataset: &str,
        params: &QueryParams,
    ) -> Result<Frame> {
        self.advise(metric);
        let fragment = match catalog::lookup(metric) {
            Some(Strategy::Custom(custom)) => (custom.build)(0, slug, params),
            Some(Strategy::Mapped(_)) => query::get_gql_query(0, dataset, params)?,
            None if !slug.is_empty() => query::get_metric(0, metric, slug, params),
            None => return Err(SanError::InvalidMetric),
        };
        self.run(metric, &fragment)
    }

    fn get_by_selector(&self, metric: &str, params: &QueryParams) -> Result<Frame> {
        if !params.has_slug_or_selector() {
            // Names the tables know are a malformed call; anything else is
            // indistinguishable from a typo.
            return Err(match catalog::lookup(metric) {
                Some(_) => SanError::InvalidCall,
                None => SanError::InvalidMetric,
            });
        }
        self.advise(metric);
        let fragment = match (catalog::custom_query(metric), params.slug_value()) {
            (Some(custom), Some(slug)) => (custom.build)(0, slug, params),
            _ => query::get_metric(0, metric, "", params),
        };
        self.run(metric, &fragment)
    }

    fn advise(&self, metric: &str) {
        if let Some(replacement) = catalog::deprecated_replacement(metric) {
            self.advisory.deprecated(metric, replacement);
        }
    }

    fn run(&self, metric: &str, fragment: &str) -> Result<Frame> {
        let doc = query::document(fragment);
        debug!("executing {} query", metric);
        let data = self.transport.execute(&doc)?;
        transform_query_result(0, metric, &data)
    }

    /// Remaining monthly, hourly and per-minute calls for the configured key.
    pub fn api_calls_remaining(&self) -> Result<ApiCallsRemaining> {
        let headers = self
            .transport
            .response_headers(&query::api_calls_history_query())
            .map_err(funnel)?;
        headers_remaining(&headers)
    }

    /// Per-interval call history for the configured key.
    pub fn api_calls_made(&self) -> Result<Vec<ApiCallRecord>> {
        let data = self
            .transport
            .execute(&query::api_calls_history_query())
            .map_err(funnel)?;
        let history = data
            .pointer("/currentUser/apiCallsHistory")
            .ok_or(SanError::UnexpectedResponse)?;
        parse_calls(history)
    }
}

// An empty result for the account query means no usable API key was sent.
fn funnel(err: SanError) -> SanError {
    match err {
        SanError::Transport(msg) if msg.contains(EMPTY_RESULT_MARKER) => SanError::NoCredential,
        other => other,
    }
}

fn headers_remaining(headers: &HashMap<String, String>) -> Result<ApiCallsRemaining> {
    let pick = |name: &str| headers.get(name).cloned().ok_or(SanError::NoRateLimits);
    Ok(ApiCallsRemaining {
        month_remaining: pick(HEADER_REMAINING_MONTH)?,
        hour_remaining: pick(HEADER_REMAINING_HOUR)?,
        minute_remaining: pick(HEADER_REMAINING_MINUTE)?,
    })
}

fn parse_calls(history: &Value) -> Result<Vec<ApiCallRecord>> {
    let records = history.as_array().ok_or(SanError::UnexpectedResponse)?;
    records
        .iter()
        .map(|rec| {
            let datetime = rec.get("datetime").and_then(Value::as_str);
            let count = rec.get("apiCallsCount").and_then(Value::as_u64);
            match (datetime, count) {
                (Some(dt), Some(n)) => Ok((dt.to_string(), n)),
                _ => Err(SanError::UnexpectedResponse),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn funnel_rewrites_empty_results_only() {
        let empty = SanError::transport("Error running query, the results are empty. Query: x");
        assert_eq!(funnel(empty), SanError::NoCredential);
        let other = SanError::transport("boom");
        assert_eq!(funnel(other.clone()), other);
    }

    #[test]
    fn calls_history_shape() {
        let ok = json!([{"datetime": "t1", "apiCallsCount": 5}]);
        assert_eq!(parse_calls(&ok).unwrap(), vec![("t1".to_string(), 5)]);
        let bad = json!([{"datetime": "t1"}]);
        assert_eq!(parse_calls(&bad), Err(SanError::UnexpectedResponse));
        assert_eq!(parse_calls(&json!({})), Err(SanError::UnexpectedResponse));
    }

    #[test]
    fn remaining_requires_all_headers() {
        let mut h = HashMap::new();
        h.insert(HEADER_REMAINING_MONTH.to_string(), "100".to_string());
        assert_eq!(headers_remaining(&h), Err(SanError::NoRateLimits));
        h.insert(HEADER_REMAINING_HOUR.to_string(), "10".to_string());
        h.insert(HEADER_REMAINING_MINUTE.to_string(), "2".to_string());
        let r = headers_remaining(&h).unwrap();
        assert_eq!(r.month_remaining, "100");
        assert_eq!(r.minute_remaining, "2");
    }

    static CAPTURED: std::sync::Mutex<Vec<(log::Level, String)>> = std::sync::Mutex::new(Vec::new());

    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            CAPTURED
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
        fn flush(&self) {}
    }

    #[test]
    fn log_advisory_warns_with_replacement() {
        static INSTALL: std::sync::Once = std::sync::Once::new();
        INSTALL.call_once(|| {
            log::set_boxed_logger(Box::new(Capture)).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
        LogAdvisory.deprecated("mvrv", "mvrv_usd");
        let captured = CAPTURED.lock().unwrap();
        let notice = captured
            .iter()
            .find(|(_, msg)| msg.contains("**NOTICE** mvrv "))
            .expect("advisory was not logged");
        assert_eq!(notice.0, log::Level::Warn);
        assert!(notice.1.contains("please use mvrv_usd instead"));
    }
}
