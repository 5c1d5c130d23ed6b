//! Dataset parsing, request parameters and query-document builders.

use crate::catalog::{self, Arg};
use crate::error::{Result, SanError};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_INTERVAL: &str = "1d";
const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Split a dataset identifier on the first `/` into `(metric, slug)`.
/// The slug is empty when no separator is present.
pub fn parse_dataset(dataset: &str) -> (&str, &str) {
    dataset.split_once('/').unwrap_or((dataset, ""))
}

/// Entity a metric is computed for: a plain slug or a structured selector
/// such as `{"organization": "ethereum"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selector {
    Slug(String),
    Object(Map<String, Value>),
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::Slug(s.to_string())
    }
}

impl From<Map<String, Value>> for Selector {
    fn from(m: Map<String, Value>) -> Self {
        Selector::Object(m)
    }
}

/// Options recognised by `get`. Dates are passed to the backend verbatim, so
/// relative forms such as `utc_now-30d` are accepted alongside ISO-8601.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub slug: Option<String>,
    pub selector: Option<Selector>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub interval: Option<String>,
    pub aggregation: Option<String>,
    pub include_incomplete_data: Option<bool>,
    /// Metric-specific arguments, rendered in insertion order.
    pub extra: Vec<(String, Value)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn selector(mut self, selector: impl Into<Selector>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn from_date(mut self, from: impl Into<String>) -> Self {
        self.from_date = Some(from.into());
        self
    }

    pub fn to_date(mut self, to: impl Into<String>) -> Self {
        self.to_date = Some(to.into());
        self
    }

    pub fn interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn include_incomplete_data(mut self, flag: bool) -> Self {
        self.include_incomplete_data = Some(flag);
        self
    }

    pub fn extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    pub fn has_slug_or_selector(&self) -> bool {
        self.slug.is_some() || self.selector.is_some()
    }

    /// Slug given by keyword, either directly or as a plain-string selector.
    pub fn slug_value(&self) -> Option<&str> {
        match (&self.slug, &self.selector) {
            (Some(s), _) => Some(s),
            (None, Some(Selector::Slug(s))) => Some(s),
            _ => None,
        }
    }

    pub fn extra_value(&self, name: &str) -> Option<&Value> {
        self.extra.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Reject values that would produce a malformed query document.
    pub fn validate(&self) -> Result<()> {
        if let Some(interval) = &self.interval {
            if interval.trim().is_empty() {
                return Err(SanError::InvalidParams("interval must not be empty".into()));
            }
        }
        if let Some(agg) = &self.aggregation {
            if !is_graphql_name(agg) {
                return Err(SanError::InvalidParams(format!(
                    "aggregation must be a bare enum value, got {:?}",
                    agg
                )));
            }
        }
        for (name, _) in &self.extra {
            if !is_graphql_name(name) {
                return Err(SanError::InvalidParams(format!(
                    "invalid argument name {:?}",
                    name
                )));
            }
        }
        if let Some(Selector::Object(map)) = &self.selector {
            if let Some(bad) = map.keys().find(|k| !is_graphql_name(k)) {
                return Err(SanError::InvalidParams(format!(
                    "invalid selector key {:?}",
                    bad
                )));
            }
        }
        Ok(())
    }

    pub fn resolved_from(&self) -> String {
        self.from_date
            .clone()
            .unwrap_or_else(|| format_ts(Utc::now() - Duration::days(DEFAULT_LOOKBACK_DAYS)))
    }

    pub fn resolved_to(&self) -> String {
        self.to_date.clone().unwrap_or_else(|| format_ts(Utc::now()))
    }

    pub fn resolved_interval(&self) -> &str {
        self.interval.as_deref().unwrap_or(DEFAULT_INTERVAL)
    }
}

fn format_ts(ts: chrono::DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn is_graphql_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render a JSON value as a GraphQL input literal. Object keys stay bare.
pub fn graphql_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // JSON string escaping is valid GraphQL string escaping.
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(graphql_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, graphql_literal(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn quoted(s: &str) -> String {
    graphql_literal(&Value::String(s.to_string()))
}

fn enum_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.to_uppercase(),
        other => graphql_literal(other),
    }
}

fn selector_arg(slug: &str, params: &QueryParams) -> Option<String> {
    if !slug.is_empty() {
        return Some(format!("slug: {}", quoted(slug)));
    }
    if let Some(s) = &params.slug {
        return Some(format!("slug: {}", quoted(s)));
    }
    match &params.selector {
        Some(Selector::Slug(s)) => Some(format!("slug: {}", quoted(s))),
        Some(Selector::Object(map)) => Some(format!(
            "selector: {}",
            graphql_literal(&Value::Object(map.clone()))
        )),
        None => None,
    }
}

/// Generic single-metric builder over `getMetric`. An empty `slug` falls
/// back to `params.slug`, then `params.selector`.
pub fn get_metric(idx: usize, metric: &str, slug: &str, params: &QueryParams) -> String {
    let mut args: Vec<String> = Vec::new();
    args.extend(selector_arg(slug, params));
    args.push(format!("from: {}", quoted(&params.resolved_from())));
    args.push(format!("to: {}", quoted(&params.resolved_to())));
    args.push(format!("interval: {}", quoted(params.resolved_interval())));
    if let Some(agg) = &params.aggregation {
        args.push(format!("aggregation: {}", agg.to_uppercase()));
    }
    if let Some(flag) = params.include_incomplete_data {
        args.push(format!("includeIncompleteData: {}", flag));
    }
    for (name, value) in &params.extra {
        args.push(format!("{}: {}", name, graphql_literal(value)));
    }
    format!(
        "query_{idx}: getMetric(metric: {metric}) {{ timeseriesData({args}) {{ datetime value }} }}",
        idx = idx,
        metric = quoted(metric),
        args = args.join(", ")
    )
}

/// Generic templated builder for metrics in the mapping table.
pub fn get_gql_query(idx: usize, dataset: &str, params: &QueryParams) -> Result<String> {
    let (metric, slug) = parse_dataset(dataset);
    let mapped = catalog::mapped_query(metric).ok_or(SanError::InvalidMetric)?;
    let slug = if slug.is_empty() {
        params.slug.as_deref().unwrap_or("")
    } else {
        slug
    };

    let mut args: Vec<String> = Vec::new();
    for arg in mapped.args {
        match arg {
            Arg::Slug if !slug.is_empty() => args.push(format!("slug: {}", quoted(slug))),
            Arg::Slug => {}
            Arg::From => args.push(format!("from: {}", quoted(&params.resolved_from()))),
            Arg::To => args.push(format!("to: {}", quoted(&params.resolved_to()))),
            Arg::Interval => {
                args.push(format!("interval: {}", quoted(params.resolved_interval())))
            }
            Arg::Extra(name) => {
                if let Some(v) = params.extra_value(name) {
                    args.push(format!("{}: {}", name, graphql_literal(v)));
                }
            }
            Arg::ExtraEnum(name) => {
                if let Some(v) = params.extra_value(name) {
                    args.push(format!("{}: {}", name, enum_value(v)));
                }
            }
        }
    }

    let call = if args.is_empty() {
        mapped.gql_name.to_string()
    } else {
        format!("{}({})", mapped.gql_name, args.join(", "))
    };
    Ok(if mapped.fields.is_empty() {
        format!("query_{}: {}", idx, call)
    } else {
        format!("query_{}: {} {{ {} }}", idx, call, mapped.fields)
    })
}

/// Dedicated builder for open/high/low/close candles.
pub fn ohlcv(idx: usize, slug: &str, params: &QueryParams) -> String {
    let slug = if slug.is_empty() {
        params.slug.as_deref().unwrap_or("")
    } else {
        slug
    };
    format!(
        "query_{idx}: ohlcv(slug: {slug}, from: {from}, to: {to}, interval: {interval}) \
         {{ datetime openPriceUsd closePriceUsd highPriceUsd lowPriceUsd volume marketcap }}",
        idx = idx,
        slug = quoted(slug),
        from = quoted(&params.resolved_from()),
        to = quoted(&params.resolved_to()),
        interval = quoted(params.resolved_interval()),
    )
}

/// Account usage history; the same document serves both the header and the
/// body variants of account introspection.
pub fn api_calls_history_query() -> String {
    r#"{ currentUser { apiCallsHistory(from: "utc_now-30d", to: "utc_now", interval: "1d", authMethod: APIKEY) { datetime apiCallsCount } } }"#
        .to_string()
}

/// Wrap a query fragment into a complete document.
pub fn document(fragment: &str) -> String {
    format!("{{ {} }}", fragment)
}
