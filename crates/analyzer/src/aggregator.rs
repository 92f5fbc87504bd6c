//! Folding endpoint results into coverage counters
//!
//! Aggregators are plain values: each worker folds its share of results
//! into its own aggregator and the partial aggregates are merged at the end,
//! so totals do not depend on processing order.

use endpoint_coverage_common::{
    service_bucket, CoverageReport, EndpointResult, ServiceStats, Warnings,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageAggregator {
    totals: ServiceStats,
    services: BTreeMap<String, ServiceStats>,
}

impl CoverageAggregator {
    pub fn record(&mut self, result: &EndpointResult) {
        self.totals.record(result.status);
        self.services
            .entry(service_bucket(&result.spec.service))
            .or_default()
            .record(result.status);
    }

    pub fn merge(mut self, other: CoverageAggregator) -> CoverageAggregator {
        self.totals.merge(&other.totals);
        for (service, stats) in other.services {
            self.services.entry(service).or_default().merge(&stats);
        }
        self
    }

    pub fn totals(&self) -> &ServiceStats {
        &self.totals
    }

    pub fn services(&self) -> &BTreeMap<String, ServiceStats> {
        &self.services
    }

    /// Attach ambiguities found in `endpoints` and build the report
    pub fn finish(self, endpoints: Vec<EndpointResult>, mut warnings: Warnings) -> CoverageReport {
        warnings
            .ambiguities
            .extend(endpoints.iter().filter_map(|r| r.ambiguity.clone()));
        CoverageReport {
            totals: self.totals,
            services: self.services,
            endpoints,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endpoint_coverage_common::{EndpointSpec, EndpointStatus, HttpMethod, UNKNOWN_SERVICE};
    use indexmap::IndexMap;

    fn result(service: &str, status: EndpointStatus) -> EndpointResult {
        EndpointResult {
            spec: EndpointSpec {
                id: format!("{service}-{status}"),
                display_name: String::new(),
                http_method: HttpMethod::Get,
                path: "/x".to_string(),
                service: service.to_string(),
                resource: String::new(),
                version: String::new(),
                doc_url: None,
                metadata: IndexMap::new(),
                line: 2,
            },
            status,
            best: None,
            considered: vec![],
            ambiguity: None,
        }
    }

    #[test]
    fn test_record_buckets() {
        let mut aggregator = CoverageAggregator::default();
        aggregator.record(&result("Alpha", EndpointStatus::Implemented));
        aggregator.record(&result("alpha", EndpointStatus::Missing));
        aggregator.record(&result("beta", EndpointStatus::Partial));
        aggregator.record(&result("???", EndpointStatus::Missing));

        assert_eq!(aggregator.totals().total, 4);
        assert_eq!(aggregator.services()["alpha"].total, 2);
        assert!((aggregator.services()["alpha"].rate - 0.5).abs() < 1e-9);
        assert_eq!(aggregator.services()["beta"].partial, 1);
        assert_eq!(aggregator.services()[UNKNOWN_SERVICE].missing, 1);
    }

    #[test]
    fn test_separator_variants_share_a_bucket() {
        let mut aggregator = CoverageAggregator::default();
        aggregator.record(&result("alpha-svc", EndpointStatus::Implemented));
        aggregator.record(&result("Alpha_Svc", EndpointStatus::Missing));

        assert_eq!(aggregator.services().len(), 1);
        assert_eq!(aggregator.services()["alphasvc"].total, 2);
        assert_eq!(aggregator.services()["alphasvc"].implemented, 1);
    }

    #[test]
    fn test_merge_matches_single_fold() {
        let results = vec![
            result("alpha", EndpointStatus::Implemented),
            result("beta", EndpointStatus::Missing),
            result("alpha", EndpointStatus::Partial),
            result("gamma", EndpointStatus::Implemented),
        ];

        let mut whole = CoverageAggregator::default();
        results.iter().for_each(|r| whole.record(r));

        let mut left = CoverageAggregator::default();
        let mut right = CoverageAggregator::default();
        results[..1].iter().for_each(|r| left.record(r));
        results[1..].iter().for_each(|r| right.record(r));

        assert_eq!(right.clone().merge(left.clone()), whole);
        assert_eq!(left.merge(right), whole);
    }
}
