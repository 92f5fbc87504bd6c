//! Stable list of unimplemented endpoints for scaffolding tools

use endpoint_coverage_common::{CoverageReport, HttpMethod};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingEndpoint<'a> {
    pub id: &'a str,
    pub service: &'a str,
    pub version: &'a str,
    pub method: HttpMethod,
    pub path: &'a str,
    pub display_name: &'a str,
    pub doc_url: Option<&'a str>,
}

/// Missing endpoints sorted by service, version, path, method and id
pub fn missing_endpoints(report: &CoverageReport) -> Vec<MissingEndpoint<'_>> {
    let mut missing: Vec<MissingEndpoint<'_>> = report
        .missing()
        .map(|r| MissingEndpoint {
            id: &r.spec.id,
            service: &r.spec.service,
            version: &r.spec.version,
            method: r.spec.http_method,
            path: &r.spec.path,
            display_name: &r.spec.display_name,
            doc_url: r.spec.doc_url.as_deref(),
        })
        .collect();
    missing.sort_by(|a, b| {
        (a.service, a.version, a.path, a.method, a.id)
            .cmp(&(b.service, b.version, b.path, b.method, b.id))
    });
    missing
}
