//! Template context for the human-readable summary

use endpoint_coverage_common::{service_bucket, CoverageReport, EndpointStatus, ServiceStats};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Serialize)]
pub struct ServiceRow<'a> {
    pub name: &'a str,
    pub stats: &'a ServiceStats,
}

#[derive(Debug, Serialize)]
pub struct MissingRow<'a> {
    pub id: &'a str,
    pub service: &'a str,
    pub method: &'static str,
    pub path: &'a str,
    pub name: &'a str,
}

/// Services by ascending coverage rate, then by name
pub fn services_by_rate(report: &CoverageReport) -> Vec<ServiceRow<'_>> {
    let mut rows: Vec<ServiceRow<'_>> = report
        .services
        .iter()
        .map(|(name, stats)| ServiceRow { name, stats })
        .collect();
    rows.sort_by(|a, b| {
        a.stats
            .rate
            .partial_cmp(&b.stats.rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(b.name))
    });
    rows
}

/// First `limit` missing endpoints, walking services from the lowest rate
pub fn worst_missing(report: &CoverageReport, limit: usize) -> Vec<MissingRow<'_>> {
    services_by_rate(report)
        .iter()
        .flat_map(|row| {
            report.endpoints.iter().filter(move |r| {
                r.status == EndpointStatus::Missing && service_bucket(&r.spec.service) == row.name
            })
        })
        .take(limit)
        .map(|r| MissingRow {
            id: &r.spec.id,
            service: &r.spec.service,
            method: r.spec.http_method.as_str(),
            path: &r.spec.path,
            name: &r.spec.display_name,
        })
        .collect()
}

/// Build the context consumed by `summary.txt`
pub fn context(report: &CoverageReport, worst: usize) -> tera::Context {
    let services = services_by_rate(report);
    let name_width = services
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);

    let load_warnings: Vec<String> = report.warnings.load.iter().map(|w| w.to_string()).collect();
    let index_warnings: Vec<String> = report.warnings.index.iter().map(|w| w.to_string()).collect();

    let mut context = tera::Context::new();
    context.insert("totals", &report.totals);
    context.insert("services", &services);
    context.insert("name_width", &name_width);
    context.insert("worst", &worst_missing(report, worst));
    context.insert("has_warnings", &!report.warnings.is_empty());
    context.insert("load_warnings", &load_warnings);
    context.insert("index_warnings", &index_warnings);
    context.insert("ambiguities", &report.warnings.ambiguities);
    context
}
