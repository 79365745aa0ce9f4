//! Error types for the library.
//!
//! Aggregation itself never fails on missing data; these errors cover the
//! fixture loading boundary and caller contract violations.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a fixture. Fatal for the session.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse CSV from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported fixture format: {0} (expected .csv or .json)")]
    UnsupportedFormat(String),

    #[error("no dataset files found under {0}")]
    NoFixtures(PathBuf),
}

/// Caller contract violations of the statistics helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("box statistics need at least {needed} values, got {got}")]
    TooFewValues { needed: usize, got: usize },

    #[error("input values are not sorted ascending")]
    Unsorted,

    #[error("input contains a non-finite value")]
    NonFinite,
}

/// Problems resolving bar-bell comparison tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("unknown comparison tag: {0}")]
    UnknownTag(String),
}
