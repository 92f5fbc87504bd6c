//! Common types and utilities for Endpoint Coverage
//!
//! This crate contains the data model shared by the catalog loader, the
//! analyzer and the report writers, together with the error taxonomy and
//! the resolver configuration.

mod config;
mod model;

pub use config::{ResolverConfig, SpecialCase, ThresholdPolicy};
pub use model::{
    CoverageReport, EndpointResult, EndpointSpec, EndpointStatus, Evidence, HttpMethod,
    IndexWarning, LoadWarning, MatchAmbiguity, MatchCandidate, ScoredMatch, ServiceStats,
    SourceCandidate, StrategyId, Warnings, UNKNOWN_SERVICE,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop a coverage run
///
/// Only the two `*Unreadable` variants are produced by the pipeline itself;
/// everything else comes from loading configuration or writing reports.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Cannot open catalog {path}: {reason}")]
    CatalogUnreadable { path: PathBuf, reason: String },

    #[error("Cannot open source tree {path}: {reason}")]
    SourceRootUnreadable { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoverageError {
    /// Whether this error means an input could not be opened at all
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            CoverageError::CatalogUnreadable { .. } | CoverageError::SourceRootUnreadable { .. }
        )
    }
}

/// Result type for coverage operations
pub type Result<T> = std::result::Result<T, CoverageError>;

/// Normalize a classification value (service, version) into an index key.
///
/// Lowercases and drops everything except ASCII alphanumerics, so
/// `Alpha-Service`, `alpha_service` and `alphaservice` share one key.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Aggregation bucket for a service classification
///
/// Keyed by [`normalize_key`], the same key the source index uses, so
/// `alpha-svc` and `alpha_svc` share a bucket. Values with nothing left after
/// normalization land in [`UNKNOWN_SERVICE`].
pub fn service_bucket(service: &str) -> String {
    let key = normalize_key(service);
    if key.is_empty() {
        UNKNOWN_SERVICE.to_string()
    } else {
        key
    }
}
