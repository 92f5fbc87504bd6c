//! Ordered keyword strategies that pair endpoints with source candidates
//!
//! Each [`Strategy`] derives keywords differently and searches the index by
//! substring match against normalized symbol names. Scoped strategies only
//! look at the endpoint's `(service, version)`; the broadened fallback looks
//! at the whole service and runs only when nothing scoped matched.
//!
//! Whatever stage finds a candidate, a symbol that also contains a
//! method-path composite keyword carries [`Evidence::MethodComposite`], which
//! the resolver uses to rank candidates sharing one file.

use crate::confidence::{apply_ceiling, ConfidenceScorer};
use crate::keywords::{self, symbol_matches};
use crate::source_index::SourceIndex;
use crate::special_cases::SpecialCaseTable;
use endpoint_coverage_common::{
    EndpointSpec, Evidence, MatchCandidate, ScoredMatch, SourceCandidate, StrategyId,
    ThresholdPolicy,
};
use std::collections::HashSet;
use tracing::debug;

/// One matching heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    KeywordFromPath,
    KeywordFromName,
    MethodPathComposite,
    SpecialCase,
    BroadenedFallback,
}

impl Strategy {
    /// Strategies restricted to the endpoint's declared version, in run order
    pub const SCOPED: [Strategy; 4] = [
        Strategy::KeywordFromPath,
        Strategy::KeywordFromName,
        Strategy::MethodPathComposite,
        Strategy::SpecialCase,
    ];

    pub fn id(&self) -> StrategyId {
        match self {
            Strategy::KeywordFromPath => StrategyId::KeywordFromPath,
            Strategy::KeywordFromName => StrategyId::KeywordFromName,
            Strategy::MethodPathComposite => StrategyId::MethodPathComposite,
            Strategy::SpecialCase => StrategyId::SpecialCase,
            Strategy::BroadenedFallback => StrategyId::BroadenedFallback,
        }
    }

    fn keywords(&self, spec: &EndpointSpec, table: &SpecialCaseTable) -> Vec<String> {
        match self {
            Strategy::KeywordFromPath => keywords::from_path(spec),
            Strategy::KeywordFromName => keywords::from_name(spec).into_iter().collect(),
            Strategy::MethodPathComposite => keywords::composite(spec),
            Strategy::SpecialCase => table.keywords(spec),
            Strategy::BroadenedFallback => keywords::best(spec).into_iter().collect(),
        }
    }

    /// Candidates this strategy finds for `spec`, in index order
    pub fn candidates(
        &self,
        spec: &EndpointSpec,
        index: &SourceIndex,
        table: &SpecialCaseTable,
        fallback_limit: usize,
    ) -> Vec<MatchCandidate> {
        let keywords = self.keywords(spec, table);
        if keywords.is_empty() {
            return Vec::new();
        }

        let (scope, limit) = match self {
            Strategy::BroadenedFallback => (index.service_candidates(&spec.service), fallback_limit),
            _ => (index.scope(&spec.service, &spec.version), usize::MAX),
        };

        scope
            .into_iter()
            .filter_map(|candidate| self.pair(candidate, &keywords))
            .take(limit)
            .collect()
    }

    fn pair(&self, candidate: &SourceCandidate, keywords: &[String]) -> Option<MatchCandidate> {
        let keyword = keywords
            .iter()
            .find(|k| symbol_matches(&candidate.symbol_name, k))?;
        Some(MatchCandidate {
            strategy_id: self.id(),
            keyword: keyword.clone(),
            candidate: candidate.clone(),
            raw_evidence: vec![Evidence::SymbolContainsKeyword {
                keyword: keyword.clone(),
            }],
        })
    }
}

/// Runs the strategy pipeline and scores what it finds
#[derive(Debug, Clone)]
pub struct Matcher {
    table: SpecialCaseTable,
    scorer: ConfidenceScorer,
    policy: ThresholdPolicy,
    fallback_limit: usize,
}

impl Matcher {
    pub fn new(
        table: SpecialCaseTable,
        scorer: ConfidenceScorer,
        policy: ThresholdPolicy,
        fallback_limit: usize,
    ) -> Self {
        Self {
            table,
            scorer,
            policy,
            fallback_limit,
        }
    }

    /// Every candidate considered for `spec`, scored, in strategy order
    ///
    /// A scoped stage that produces a candidate at or above the implemented
    /// threshold ends the pipeline. The same source location found by a
    /// later stage is kept once, under the earliest strategy.
    pub fn run(&self, spec: &EndpointSpec, index: &SourceIndex) -> Vec<ScoredMatch> {
        let mut considered: Vec<ScoredMatch> = Vec::new();
        let mut seen: HashSet<(String, usize)> = HashSet::new();
        let composites = keywords::composite(spec);

        for strategy in Strategy::SCOPED {
            let found = strategy.candidates(spec, index, &self.table, self.fallback_limit);
            let scored = self.score_new(found, spec, index, &composites, &mut seen);
            let high = scored
                .iter()
                .any(|s| s.confidence >= self.policy.implemented);

            debug!(
                endpoint = %spec.id,
                strategy = %strategy.id(),
                found = scored.len(),
                high,
                "strategy finished"
            );
            considered.extend(scored);
            if high {
                return considered;
            }
        }

        if considered.is_empty() {
            let found = Strategy::BroadenedFallback.candidates(
                spec,
                index,
                &self.table,
                self.fallback_limit,
            );
            considered = self
                .score_new(found, spec, index, &composites, &mut seen)
                .into_iter()
                .map(|s| apply_ceiling(s, self.policy.fallback_ceiling))
                .collect();
            debug!(
                endpoint = %spec.id,
                found = considered.len(),
                "broadened fallback finished"
            );
        }

        considered
    }

    fn score_new(
        &self,
        found: Vec<MatchCandidate>,
        spec: &EndpointSpec,
        index: &SourceIndex,
        composites: &[String],
        seen: &mut HashSet<(String, usize)>,
    ) -> Vec<ScoredMatch> {
        found
            .into_iter()
            .filter(|m| seen.insert((m.candidate.file_path.clone(), m.candidate.line_number)))
            .map(|mut m| {
                if let Some(keyword) = composites
                    .iter()
                    .find(|k| symbol_matches(&m.candidate.symbol_name, k))
                {
                    m.raw_evidence.push(Evidence::MethodComposite {
                        keyword: keyword.clone(),
                    });
                }
                let content = index.file_content(&m.candidate.file_path);
                self.scorer.score(m, spec, content.as_deref().unwrap_or(""))
            })
            .collect()
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }
}
