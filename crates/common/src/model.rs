//! Data model for catalog entries, discovered candidates and coverage results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Bucket for endpoints whose service classification is empty or unusable
pub const UNKNOWN_SERVICE: &str = "unknown";

/// HTTP method of a catalog endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Uppercase wire token (e.g. `DELETE`)
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported HTTP method '{other}'")),
        }
    }
}

/// One row of the endpoint catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    /// Opaque identifier from the catalog
    pub id: String,
    pub display_name: String,
    pub http_method: HttpMethod,
    /// URL path template, may contain `{param}` segments
    pub path: String,
    pub service: String,
    pub resource: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    /// Columns the loader does not interpret, in catalog order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
    /// 1-based line of the row in the catalog source
    pub line: usize,
}

/// A function-like definition discovered in the implementation tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCandidate {
    /// Path relative to the source root, `/`-separated
    pub file_path: String,
    pub symbol_name: String,
    /// 1-based line of the definition
    pub line_number: usize,
    pub service_hint: String,
    /// Empty when the service directory has no version sub-directories
    pub version_hint: String,
    /// Declaration text from the signature line up to the body opener
    pub signature: String,
}

/// Heuristic that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyId {
    KeywordFromPath,
    KeywordFromName,
    MethodPathComposite,
    SpecialCase,
    BroadenedFallback,
}

impl StrategyId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::KeywordFromPath => "keyword-from-path",
            StrategyId::KeywordFromName => "keyword-from-name",
            StrategyId::MethodPathComposite => "method-path-composite",
            StrategyId::SpecialCase => "special-case",
            StrategyId::BroadenedFallback => "broadened-fallback",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal observed while matching or scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Evidence {
    /// The symbol name contains the derived keyword
    SymbolContainsKeyword { keyword: String },
    /// The declaration returns the standard response wrapper
    ResponseWrapper { token: String },
    /// The file calls the outbound request construct
    TransportConstruct { token: String },
    /// The file mentions the endpoint's HTTP method
    MethodToken { method: HttpMethod },
    /// The file declares an endpoint path constant or the literal path
    PathConstant { text: String },
    /// Confidence was lowered to the fallback ceiling
    FallbackCeiling { ceiling: f64 },
    /// The symbol name pairs a verb for the endpoint's method with its path
    MethodComposite { keyword: String },
}

impl Evidence {
    /// Whether this evidence ties the symbol itself to the endpoint's method
    pub fn is_method_composite(&self) -> bool {
        matches!(self, Evidence::MethodComposite { .. })
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::SymbolContainsKeyword { keyword } => {
                write!(f, "symbol contains '{keyword}'")
            }
            Evidence::ResponseWrapper { token } => write!(f, "returns {token}"),
            Evidence::TransportConstruct { token } => write!(f, "calls {token}"),
            Evidence::MethodToken { method } => write!(f, "mentions {method}"),
            Evidence::PathConstant { text } => write!(f, "path constant {text}"),
            Evidence::FallbackCeiling { ceiling } => write!(f, "capped at {ceiling:.2}"),
            Evidence::MethodComposite { keyword } => write!(f, "symbol encodes '{keyword}'"),
        }
    }
}

/// One endpoint paired with one candidate by a specific strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub strategy_id: StrategyId,
    pub keyword: String,
    pub candidate: SourceCandidate,
    pub raw_evidence: Vec<Evidence>,
}

/// A match candidate with its confidence in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMatch {
    #[serde(flatten)]
    pub matched: MatchCandidate,
    pub confidence: f64,
}

/// Resolution status of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Missing,
    Partial,
    Implemented,
}

impl EndpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointStatus::Missing => "missing",
            EndpointStatus::Partial => "partial",
            EndpointStatus::Implemented => "implemented",
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Several candidates tied for the best confidence of one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAmbiguity {
    pub endpoint_id: String,
    pub confidence: f64,
    /// `file:line symbol` for every tied candidate, chosen one first
    pub candidates: Vec<String>,
}

/// Resolved status of one catalog endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResult {
    pub spec: EndpointSpec,
    pub status: EndpointStatus,
    pub best: Option<ScoredMatch>,
    /// Every candidate considered, in strategy order
    pub considered: Vec<ScoredMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambiguity: Option<MatchAmbiguity>,
}

impl EndpointResult {
    pub fn confidence(&self) -> f64 {
        self.best.as_ref().map(|b| b.confidence).unwrap_or(0.0)
    }
}

/// Per-service (or overall) coverage counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStats {
    pub total: usize,
    pub implemented: usize,
    pub partial: usize,
    pub missing: usize,
    pub rate: f64,
}

impl ServiceStats {
    pub fn record(&mut self, status: EndpointStatus) {
        self.total += 1;
        match status {
            EndpointStatus::Implemented => self.implemented += 1,
            EndpointStatus::Partial => self.partial += 1,
            EndpointStatus::Missing => self.missing += 1,
        }
        self.refresh_rate();
    }

    pub fn merge(&mut self, other: &ServiceStats) {
        self.total += other.total;
        self.implemented += other.implemented;
        self.partial += other.partial;
        self.missing += other.missing;
        self.refresh_rate();
    }

    fn refresh_rate(&mut self) {
        self.rate = if self.total == 0 {
            0.0
        } else {
            self.implemented as f64 / self.total as f64
        };
    }
}

/// A catalog row that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catalog line {}: {}", self.line, self.reason)
    }
}

/// A file or directory the index could not read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexWarning {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for IndexWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Everything that was recovered from rather than reported as coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warnings {
    pub load: Vec<LoadWarning>,
    pub index: Vec<IndexWarning>,
    pub ambiguities: Vec<MatchAmbiguity>,
}

impl Warnings {
    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.index.is_empty() && self.ambiguities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.load.len() + self.index.len() + self.ambiguities.len()
    }
}

/// Aggregate outcome of one coverage run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub totals: ServiceStats,
    pub services: BTreeMap<String, ServiceStats>,
    /// Results in catalog order
    pub endpoints: Vec<EndpointResult>,
    pub warnings: Warnings,
}

impl CoverageReport {
    pub fn missing(&self) -> impl Iterator<Item = &EndpointResult> {
        self.endpoints
            .iter()
            .filter(|r| r.status == EndpointStatus::Missing)
    }
}
