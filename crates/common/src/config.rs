//! Resolver configuration loaded from YAML files
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! configuration suited to TypeScript and Rust SDK trees.

use crate::{CoverageError, EndpointStatus, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Confidence thresholds used to classify endpoints
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Minimum confidence for `Implemented`
    pub implemented: f64,
    /// Minimum confidence for `Partial`
    pub partial: f64,
    /// Highest confidence a broadened-fallback match may carry
    pub fallback_ceiling: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            implemented: 0.8,
            partial: 0.5,
            fallback_ceiling: 0.75,
        }
    }
}

impl ThresholdPolicy {
    /// Classify a best confidence; `None` means no candidate was found
    pub fn classify(&self, confidence: Option<f64>) -> EndpointStatus {
        match confidence {
            Some(c) if c >= self.implemented => EndpointStatus::Implemented,
            Some(c) if c >= self.partial => EndpointStatus::Partial,
            _ => EndpointStatus::Missing,
        }
    }

    fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.implemented) || !in_range(self.partial) || !in_range(self.fallback_ceiling)
        {
            return Err(CoverageError::Config(
                "thresholds must lie within [0, 1]".to_string(),
            ));
        }
        if self.partial > self.implemented {
            return Err(CoverageError::Config(format!(
                "partial threshold {} exceeds implemented threshold {}",
                self.partial, self.implemented
            )));
        }
        if self.fallback_ceiling >= self.implemented {
            return Err(CoverageError::Config(format!(
                "fallback ceiling {} must stay below implemented threshold {}",
                self.fallback_ceiling, self.implemented
            )));
        }
        Ok(())
    }
}

/// An irregular endpoint the generic keyword rules mis-derive
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SpecialCase {
    /// Restrict the entry to one service; applies to every service when absent
    #[serde(default)]
    pub service: Option<String>,
    /// Case-insensitive fragment looked up in the endpoint path and display name
    pub fragment: String,
    /// Keywords searched for when the fragment is present, in order
    pub keywords: Vec<String>,
}

impl SpecialCase {
    pub fn new(service: Option<&str>, fragment: &str, keywords: &[&str]) -> Self {
        Self {
            service: service.map(str::to_string),
            fragment: fragment.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Settings for indexing, matching and scoring
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Source file extensions to scan, without the leading dot
    pub extensions: Vec<String>,
    /// File name suffixes that mark non-functional files
    pub excluded_suffixes: Vec<String>,
    /// Exact file names that mark non-functional files
    pub excluded_file_names: Vec<String>,
    /// Directory names never descended into
    pub excluded_dirs: Vec<String>,
    /// Top-level directory names never treated as services
    pub ignored_top_level: Vec<String>,
    /// Regexes whose first capture group is the exported async function name
    pub signature_patterns: Vec<String>,
    /// Declaration tokens naming the standard response wrapper
    pub response_wrappers: Vec<String>,
    /// File tokens naming the outbound request construct
    pub transport_markers: Vec<String>,
    /// Project-specific exceptions, consulted before the built-in table
    pub special_cases: Vec<SpecialCase>,
    pub thresholds: ThresholdPolicy,
    /// Maximum number of broadened-fallback results per endpoint
    pub fallback_limit: usize,
    /// Worker threads for the match stage, 0 for the rayon default
    pub jobs: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: strings(&["ts", "js", "mjs", "rs"]),
            excluded_suffixes: strings(&[
                ".test.ts",
                ".spec.ts",
                ".test.js",
                ".spec.js",
                ".d.ts",
                ".types.ts",
                "_test.rs",
            ]),
            excluded_file_names: strings(&[
                "index.ts",
                "index.js",
                "index.mjs",
                "types.ts",
                "mod.rs",
                "lib.rs",
                "types.rs",
            ]),
            excluded_dirs: strings(&[
                "__tests__",
                "__mocks__",
                "fixtures",
                "tests",
                "node_modules",
                "dist",
                "target",
            ]),
            ignored_top_level: strings(&["common", "utils", "shared", "types", "core"]),
            signature_patterns: strings(&[
                r"^\s*export\s+(?:default\s+)?async\s+function\s*\*?\s*([A-Za-z_$][\w$]*)",
                r"^\s*export\s+const\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*async\b",
                r"^\s*pub(?:\([^)]*\))?\s+async\s+fn\s+([A-Za-z_][A-Za-z0-9_]*)",
            ]),
            response_wrappers: strings(&["ApiResponse", "Promise<Response", "Result<Response"]),
            transport_markers: strings(&[
                "request(",
                "this.request",
                "client.request",
                "httpClient.",
                "fetch(",
            ]),
            special_cases: Vec::new(),
            thresholds: ThresholdPolicy::default(),
            fallback_limit: 2,
            jobs: 0,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a YAML file, filling gaps with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoverageError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ResolverConfig = if content.trim().is_empty() {
            ResolverConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.signature_patterns.is_empty() {
            return Err(CoverageError::Config(
                "at least one signature pattern is required".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(CoverageError::Config(
                "at least one source extension is required".to_string(),
            ));
        }
        if let Some(case) = self.special_cases.iter().find(|c| c.keywords.is_empty()) {
            return Err(CoverageError::Config(format!(
                "special case '{}' has no keywords",
                case.fragment
            )));
        }
        Ok(())
    }
}
