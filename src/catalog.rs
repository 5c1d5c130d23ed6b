//! Static vocabularies that decide how a metric is turned into a query.
//!
//! Membership of these tables is observable: callers rely on exactly which
//! names warn, which take a dedicated builder and which may omit a slug.

use crate::query::{self, QueryParams};

/// Argument slots a mapped query accepts, rendered in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Slug,
    From,
    To,
    Interval,
    /// Optional extra argument rendered as a GraphQL literal.
    Extra(&'static str),
    /// Optional extra argument rendered as a bare (upper-cased) enum value.
    ExtraEnum(&'static str),
}

/// Query rendered by the generic templated builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedQuery {
    pub gql_name: &'static str,
    pub args: &'static [Arg],
    pub fields: &'static str,
    /// Nested list exploded into one row per element by the transformer.
    pub explode: Option<&'static str>,
}

pub type CustomBuilder = fn(usize, &str, &QueryParams) -> String;

/// Query with a dedicated builder that bypasses the template.
#[derive(Clone, Copy)]
pub struct CustomQuery {
    pub name: &'static str,
    pub build: CustomBuilder,
}

impl std::fmt::Debug for CustomQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomQuery").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    Custom(&'static CustomQuery),
    Mapped(&'static MappedQuery),
}

const TIMESERIES: &[Arg] = &[Arg::Slug, Arg::From, Arg::To, Arg::Interval];

const fn series(gql_name: &'static str, fields: &'static str) -> MappedQuery {
    MappedQuery {
        gql_name,
        args: TIMESERIES,
        fields,
        explode: None,
    }
}

static CUSTOM_QUERIES: &[CustomQuery] = &[CustomQuery {
    name: "ohlcv",
    build: query::ohlcv,
}];

static QUERY_MAPPING: &[(&str, MappedQuery)] = &[
    ("daily_active_addresses", series("dailyActiveAddresses", "datetime activeAddresses")),
    ("burn_rate", series("burnRate", "datetime burnRate")),
    ("token_age_consumed", series("tokenAgeConsumed", "datetime tokenAgeConsumed")),
    ("token_velocity", series("tokenVelocity", "datetime tokenVelocity")),
    ("token_circulation", series("tokenCirculation", "datetime tokenCirculation")),
    ("transaction_volume", series("transactionVolume", "datetime transactionVolume")),
    ("realized_value", series("realizedValue", "datetime realizedValue")),
    ("mvrv_ratio", series("mvrvRatio", "datetime ratio")),
    ("nvt_ratio", series("nvtRatio", "datetime nvtRatioCirculation nvtRatioTxVolume")),
    ("network_growth", series("networkGrowth", "datetime newAddresses")),
    ("daily_active_deposits", series("dailyActiveDeposits", "datetime activeDeposits")),
    ("exchange_funds_flow", series("exchangeFundsFlow", "datetime inOutDifference")),
    ("dev_activity", series("devActivity", "datetime activity")),
    ("github_activity", series("githubActivity", "datetime activity")),
    ("prices", series("historyPrice", "datetime priceUsd priceBtc marketcap volume")),
    ("gas_used", series("gasUsed", "datetime gasUsed")),
    ("miners_balance", series("minersBalance", "datetime balance")),
    ("mining_pools_distribution", series("miningPoolsDistribution", "datetime top3 top10 other")),
    (
        "percent_of_token_supply_on_exchanges",
        series("percentOfTokenSupplyOnExchanges", "datetime percentOnExchanges"),
    ),
    (
        "historical_balance",
        MappedQuery {
            gql_name: "historicalBalance",
            args: &[Arg::Slug, Arg::From, Arg::To, Arg::Interval, Arg::Extra("address")],
            fields: "datetime balance",
            explode: None,
        },
    ),
    (
        "social_volume",
        MappedQuery {
            gql_name: "socialVolume",
            args: &[
                Arg::Slug,
                Arg::From,
                Arg::To,
                Arg::Interval,
                Arg::ExtraEnum("socialVolumeType"),
            ],
            fields: "datetime mentionsCount",
            explode: None,
        },
    ),
    (
        "social_dominance",
        MappedQuery {
            gql_name: "socialDominance",
            args: &[Arg::Slug, Arg::From, Arg::To, Arg::Interval, Arg::ExtraEnum("source")],
            fields: "datetime dominance",
            explode: None,
        },
    ),
    (
        "social_volume_projects",
        MappedQuery {
            gql_name: "socialVolumeProjects",
            args: &[],
            fields: "",
            explode: None,
        },
    ),
    (
        "emerging_trends",
        MappedQuery {
            gql_name: "getTrendingWords",
            args: &[Arg::From, Arg::To, Arg::Interval, Arg::Extra("size")],
            fields: "datetime topWords { word score }",
            explode: Some("topWords"),
        },
    ),
    (
        "top_social_gainers_losers",
        MappedQuery {
            gql_name: "topSocialGainersLosers",
            args: &[
                Arg::From,
                Arg::To,
                Arg::ExtraEnum("status"),
                Arg::Extra("size"),
                Arg::Extra("timeWindow"),
            ],
            fields: "datetime projects { change slug status }",
            explode: Some("projects"),
        },
    ),
];

static DEPRECATED_QUERIES: &[(&str, &str)] = &[
    ("mvrv_ratio", "mvrv_usd"),
    ("nvt_ratio", "nvt"),
    ("realized_value", "realized_value_usd"),
    ("token_circulation", "circulation_1d"),
    ("burn_rate", "age_destroyed"),
    ("token_age_consumed", "age_destroyed"),
    ("token_velocity", "velocity"),
    ("daily_active_deposits", "active_deposits"),
    ("social_volume", "social_volume_{source}"),
    ("social_dominance", "social_dominance_{source}"),
];

static NO_SLUG_QUERIES: &[&str] = &[
    "social_volume_projects",
    "emerging_trends",
    "top_social_gainers_losers",
];

/// Resolve the construction strategy for a metric. Custom builders win over
/// the template when a name appears in both tables.
pub fn lookup(metric: &str) -> Option<Strategy> {
    if let Some(c) = custom_query(metric) {
        return Some(Strategy::Custom(c));
    }
    mapped_query(metric).map(Strategy::Mapped)
}

pub fn custom_query(metric: &str) -> Option<&'static CustomQuery> {
    CUSTOM_QUERIES.iter().find(|c| c.name == metric)
}

pub fn mapped_query(metric: &str) -> Option<&'static MappedQuery> {
    QUERY_MAPPING
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, q)| q)
}

pub fn deprecated_replacement(metric: &str) -> Option<&'static str> {
    DEPRECATED_QUERIES
        .iter()
        .find(|(name, _)| *name == metric)
        .map(|(_, repl)| *repl)
}

pub fn is_no_slug(metric: &str) -> bool {
    NO_SLUG_QUERIES.contains(&metric)
}

/// Nested list the transformer should explode for this metric, if any.
pub fn explode_field(metric: &str) -> Option<&'static str> {
    mapped_query(metric).and_then(|q| q.explode)
}

pub fn custom_names() -> impl Iterator<Item = &'static str> {
    CUSTOM_QUERIES.iter().map(|c| c.name)
}

pub fn mapped_names() -> impl Iterator<Item = &'static str> {
    QUERY_MAPPING.iter().map(|(name, _)| *name)
}

pub fn deprecated() -> impl Iterator<Item = (&'static str, &'static str)> {
    DEPRECATED_QUERIES.iter().copied()
}

pub fn no_slug_names() -> impl Iterator<Item = &'static str> {
    NO_SLUG_QUERIES.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohlcv_is_custom() {
        assert!(matches!(lookup("ohlcv"), Some(Strategy::Custom(c)) if c.name == "ohlcv"));
        assert!(mapped_query("ohlcv").is_none());
    }

    #[test]
    fn deprecated_aliases_stay_resolvable() {
        for (name, _) in deprecated() {
            assert!(lookup(name).is_some(), "{} has no strategy", name);
        }
        assert_eq!(deprecated_replacement("mvrv_ratio"), Some("mvrv_usd"));
        assert_eq!(deprecated_replacement("daily_active_addresses"), None);
    }

    #[test]
    fn no_slug_set_membership() {
        assert_eq!(
            no_slug_names().collect::<Vec<_>>(),
            vec![
                "social_volume_projects",
                "emerging_trends",
                "top_social_gainers_losers"
            ]
        );
        assert!(!is_no_slug("daily_active_addresses"));
        for name in no_slug_names() {
            let q = mapped_query(name).unwrap();
            assert!(!q.args.contains(&Arg::Slug));
        }
    }

    #[test]
    fn explode_fields() {
        assert_eq!(explode_field("emerging_trends"), Some("topWords"));
        assert_eq!(explode_field("top_social_gainers_losers"), Some("projects"));
        assert_eq!(explode_field("prices"), None);
        assert_eq!(explode_field("ohlcv"), None);
    }
}
