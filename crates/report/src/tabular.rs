//! Per-endpoint CSV export
//!
//! Columns mirror the catalog fields, then every pass-through metadata column
//! in first-seen order, then the resolution columns.

use endpoint_coverage_common::{CoverageError, CoverageReport, Result};

const CATALOG_COLUMNS: [&str; 8] = [
    "id", "name", "method", "path", "service", "resource", "version", "doc_url",
];
const RESOLUTION_COLUMNS: [&str; 5] = [
    "status",
    "confidence",
    "matched_file",
    "matched_line",
    "matched_symbol",
];

fn metadata_columns(report: &CoverageReport) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for result in &report.endpoints {
        for key in result.spec.metadata.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns
}

pub fn render(report: &CoverageReport) -> Result<String> {
    let csv_error = |e: csv::Error| CoverageError::Report(format!("CSV error: {}", e));
    let metadata = metadata_columns(report);

    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = CATALOG_COLUMNS
        .iter()
        .chain(metadata.iter())
        .chain(RESOLUTION_COLUMNS.iter());
    writer.write_record(header).map_err(csv_error)?;

    for result in &report.endpoints {
        let spec = &result.spec;
        let mut record: Vec<String> = vec![
            spec.id.clone(),
            spec.display_name.clone(),
            spec.http_method.to_string(),
            spec.path.clone(),
            spec.service.clone(),
            spec.resource.clone(),
            spec.version.clone(),
            spec.doc_url.clone().unwrap_or_default(),
        ];
        record.extend(
            metadata
                .iter()
                .map(|key| spec.metadata.get(*key).cloned().unwrap_or_default()),
        );

        record.push(result.status.to_string());
        record.push(format!("{:.2}", result.confidence()));
        match &result.best {
            Some(best) => {
                let candidate = &best.matched.candidate;
                record.push(candidate.file_path.clone());
                record.push(candidate.line_number.to_string());
                record.push(candidate.symbol_name.clone());
            }
            None => record.extend(std::iter::repeat(String::new()).take(3)),
        }

        writer.write_record(&record).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoverageError::Report(format!("CSV error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| CoverageError::Report(e.to_string()))
}
