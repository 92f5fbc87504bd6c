//! Coverage resolution pipeline
//!
//! Load → Index → Match-all → Aggregate. Index construction finishes before
//! any matching starts; matching runs on a rayon pool over the shared,
//! read-only index.

use crate::aggregator::CoverageAggregator;
use crate::confidence::ConfidenceScorer;
use crate::matcher::Matcher;
use crate::signature::SignatureScanner;
use crate::source_index::SourceIndex;
use crate::special_cases::SpecialCaseTable;
use endpoint_coverage_catalog::{Catalog, CatalogLoader};
use endpoint_coverage_common::{
    CoverageReport, EndpointResult, EndpointSpec, Evidence, MatchAmbiguity, ResolverConfig,
    Result, ScoredMatch, Warnings,
};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Coverage resolver - main entry point
pub struct CoverageResolver {
    config: ResolverConfig,
    services: Vec<String>,
    matcher: Matcher,
}

impl CoverageResolver {
    /// Create a resolver; fails only on invalid configuration
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        SignatureScanner::new(&config.signature_patterns)?;
        let matcher = Matcher::new(
            SpecialCaseTable::new(&config.special_cases),
            ConfidenceScorer::new(&config)?,
            config.thresholds,
            config.fallback_limit,
        );
        Ok(Self {
            config,
            services: Vec::new(),
            matcher,
        })
    }

    /// Restrict processing to the named services
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the full pipeline from a catalog file and a source tree
    pub fn run(&self, catalog_path: &Path, source_root: &Path) -> Result<CoverageReport> {
        let started = Instant::now();

        info!(catalog = %catalog_path.display(), "loading catalog");
        let catalog = CatalogLoader::from_file(catalog_path)?.load();

        let index = self.build_index(source_root)?;
        let report = self.resolve(catalog, &index);

        info!(
            endpoints = report.totals.total,
            implemented = report.totals.implemented,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "coverage run complete"
        );
        Ok(report)
    }

    /// Build the source index with this resolver's configuration and filter
    pub fn build_index(&self, source_root: &Path) -> Result<SourceIndex> {
        info!(root = %source_root.display(), "indexing source tree");
        SourceIndex::build(source_root, &self.config, &self.services)
    }

    /// Resolve every catalog endpoint against a prebuilt index
    pub fn resolve(&self, mut catalog: Catalog, index: &SourceIndex) -> CoverageReport {
        catalog.retain_services(&self.services);
        let specs = catalog.endpoints;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build();

        let (results, aggregator) = match pool {
            Ok(pool) => pool.install(|| self.match_all(&specs, index)),
            Err(e) => {
                warn!(error = %e, "thread pool unavailable, matching sequentially");
                self.match_sequential(&specs, index)
            }
        };

        let (cached_files, cached_dirs) = index.cache_sizes();
        debug!(cached_files, cached_dirs, "match stage finished");

        let warnings = Warnings {
            load: catalog.warnings,
            index: index.warnings().to_vec(),
            ambiguities: Vec::new(),
        };
        aggregator.finish(results, warnings)
    }

    fn match_all(
        &self,
        specs: &[EndpointSpec],
        index: &SourceIndex,
    ) -> (Vec<EndpointResult>, CoverageAggregator) {
        let results: Vec<EndpointResult> = specs
            .par_iter()
            .map(|spec| self.resolve_endpoint(spec, index))
            .collect();

        let aggregator = results
            .par_iter()
            .fold(CoverageAggregator::default, |mut agg, result| {
                agg.record(result);
                agg
            })
            .reduce(CoverageAggregator::default, CoverageAggregator::merge);

        (results, aggregator)
    }

    fn match_sequential(
        &self,
        specs: &[EndpointSpec],
        index: &SourceIndex,
    ) -> (Vec<EndpointResult>, CoverageAggregator) {
        let mut aggregator = CoverageAggregator::default();
        let results = specs
            .iter()
            .map(|spec| {
                let result = self.resolve_endpoint(spec, index);
                aggregator.record(&result);
                result
            })
            .collect();
        (results, aggregator)
    }

    /// Match, score and classify one endpoint
    pub fn resolve_endpoint(&self, spec: &EndpointSpec, index: &SourceIndex) -> EndpointResult {
        let considered = self.matcher.run(spec, index);
        let best = pick_best(&considered).cloned();
        let status = self
            .matcher
            .policy()
            .classify(best.as_ref().map(|b| b.confidence));
        let ambiguity = ambiguity(spec, &considered, best.as_ref());

        debug!(
            endpoint = %spec.id,
            status = %status,
            candidates = considered.len(),
            "endpoint resolved"
        );

        EndpointResult {
            spec: spec.clone(),
            status,
            best,
            considered,
            ambiguity,
        }
    }
}

/// Ranking key: confidence first, then whether the symbol itself encodes the
/// endpoint's method
fn rank(scored: &ScoredMatch) -> (f64, bool) {
    let encodes_method = scored
        .matched
        .raw_evidence
        .iter()
        .any(Evidence::is_method_composite);
    (scored.confidence, encodes_method)
}

/// Highest rank wins; ties go to the earliest candidate
fn pick_best(considered: &[ScoredMatch]) -> Option<&ScoredMatch> {
    considered.iter().fold(None, |best, scored| match best {
        Some(b) if rank(b) >= rank(scored) => Some(b),
        _ => Some(scored),
    })
}

fn ambiguity(
    spec: &EndpointSpec,
    considered: &[ScoredMatch],
    best: Option<&ScoredMatch>,
) -> Option<MatchAmbiguity> {
    let best = best?;
    let tied: Vec<String> = considered
        .iter()
        .filter(|s| rank(s) == rank(best))
        .map(|s| {
            let c = &s.matched.candidate;
            format!("{}:{} {}", c.file_path, c.line_number, c.symbol_name)
        })
        .collect();

    (tied.len() > 1).then(|| MatchAmbiguity {
        endpoint_id: spec.id.clone(),
        confidence: best.confidence,
        candidates: tied,
    })
}
