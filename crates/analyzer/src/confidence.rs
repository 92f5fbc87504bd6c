//! Confidence scoring for match candidates
//!
//! Scores are additive in whole points (hundredths) and converted to a
//! fraction at the end, so thresholds such as 0.8 compare exactly.

use endpoint_coverage_common::{
    CoverageError, EndpointSpec, Evidence, HttpMethod, MatchCandidate, ResolverConfig, Result,
    ScoredMatch,
};
use regex::Regex;

const BASE_POINTS: u32 = 50;
const RESPONSE_WRAPPER_POINTS: u32 = 20;
const TRANSPORT_POINTS: u32 = 20;
const METHOD_TOKEN_POINTS: u32 = 10;
const PATH_CONSTANT_POINTS: u32 = 10;
const MAX_POINTS: u32 = 100;

/// Structural-evidence scorer
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    response_wrappers: Vec<String>,
    transport_markers: Vec<String>,
    method_tokens: Vec<(HttpMethod, Regex)>,
    path_constant: Regex,
}

impl ConfidenceScorer {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CoverageError::Config(e.to_string()))
        };

        let method_tokens = HttpMethod::ALL
            .iter()
            .map(|method| {
                let upper = method.as_str();
                let lower = upper.to_ascii_lowercase();
                let pattern = format!(r#"\b{upper}\b|["'`]{lower}["'`]"#);
                compile(&pattern).map(|regex| (*method, regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            response_wrappers: config.response_wrappers.clone(),
            transport_markers: config.transport_markers.clone(),
            method_tokens,
            path_constant: compile(r"\b[A-Z][A-Z0-9_]*_(?:PATH|URL|URI|ENDPOINT|ROUTE)\b")?,
        })
    }

    /// Score one candidate against the content of the file it lives in
    pub fn score(
        &self,
        mut candidate: MatchCandidate,
        spec: &EndpointSpec,
        file_content: &str,
    ) -> ScoredMatch {
        let mut points = BASE_POINTS;

        if let Some(token) = self
            .response_wrappers
            .iter()
            .find(|w| candidate.candidate.signature.contains(w.as_str()))
        {
            points += RESPONSE_WRAPPER_POINTS;
            candidate.raw_evidence.push(Evidence::ResponseWrapper {
                token: token.clone(),
            });
        }

        if let Some(token) = self
            .transport_markers
            .iter()
            .find(|m| file_content.contains(m.as_str()))
        {
            points += TRANSPORT_POINTS;
            candidate.raw_evidence.push(Evidence::TransportConstruct {
                token: token.clone(),
            });
        }

        let method_seen = self
            .method_tokens
            .iter()
            .any(|(method, regex)| *method == spec.http_method && regex.is_match(file_content));
        if method_seen {
            points += METHOD_TOKEN_POINTS;
            candidate.raw_evidence.push(Evidence::MethodToken {
                method: spec.http_method,
            });
        }

        if let Some(text) = self.path_evidence(spec, file_content) {
            points += PATH_CONSTANT_POINTS;
            candidate.raw_evidence.push(Evidence::PathConstant { text });
        }

        ScoredMatch {
            matched: candidate,
            confidence: f64::from(points.min(MAX_POINTS)) / 100.0,
        }
    }

    /// A named path constant, or the endpoint's static path prefix as a literal
    fn path_evidence(&self, spec: &EndpointSpec, file_content: &str) -> Option<String> {
        if let Some(found) = self.path_constant.find(file_content) {
            return Some(found.as_str().to_string());
        }
        let prefix = static_prefix(&spec.path);
        (prefix.len() > 1 && file_content.contains(prefix)).then(|| prefix.to_string())
    }
}

/// Lower a fallback match to the ceiling, recording that it happened
pub fn apply_ceiling(mut scored: ScoredMatch, ceiling: f64) -> ScoredMatch {
    if scored.confidence > ceiling {
        scored.confidence = ceiling;
        scored
            .matched
            .raw_evidence
            .push(Evidence::FallbackCeiling { ceiling });
    }
    scored
}

/// Path up to (not including) the first parameter segment, without a trailing slash
fn static_prefix(path: &str) -> &str {
    let end = path
        .find(['{', '<', ':', '?'])
        .unwrap_or(path.len());
    path[..end].trim_end_matches('/')
}
