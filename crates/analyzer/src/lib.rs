//! Endpoint coverage analyzer
//!
//! Indexes an SDK source tree, matches every catalog endpoint against it with
//! an ordered keyword pipeline, scores the candidates and aggregates the
//! resulting statuses into a coverage report.
//!
//! # Examples
//!
//! ```no_run
//! use endpoint_coverage_analyzer::CoverageResolver;
//! use endpoint_coverage_common::ResolverConfig;
//! use std::path::Path;
//!
//! let resolver = CoverageResolver::new(ResolverConfig::default())
//!     .expect("valid configuration")
//!     .with_services(vec!["billing".to_string()]);
//! let report = resolver
//!     .run(Path::new("endpoints.csv"), Path::new("./sdk/src"))
//!     .expect("Resolution failed");
//!
//! println!("Implemented: {:.1}%", report.totals.rate * 100.0);
//! ```

mod aggregator;
mod cache;
mod confidence;
pub mod keywords;
mod matcher;
mod resolver;
mod signature;
mod source_index;
mod special_cases;

pub use aggregator::CoverageAggregator;
pub use confidence::{apply_ceiling, ConfidenceScorer};
pub use matcher::{Matcher, Strategy};
pub use resolver::CoverageResolver;
pub use signature::SignatureScanner;
pub use source_index::{ServiceSummary, SourceIndex, VersionSummary};
pub use special_cases::SpecialCaseTable;
