//! Report rendering for endpoint coverage
//!
//! Turns an already-computed [`CoverageReport`] into files: a per-endpoint
//! CSV export, a plain-text summary, full JSON/YAML dumps and the
//! `missing.json` list. Rendering never re-runs matching.

mod missing;
mod summary;
mod tabular;
mod templates;

pub use missing::{missing_endpoints, MissingEndpoint};
pub use summary::{services_by_rate, worst_missing};

use endpoint_coverage_common::{CoverageError, CoverageReport, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tera::Tera;
use tracing::{debug, info};

/// Missing endpoints listed in the summary by default
pub const DEFAULT_WORST: usize = 20;

/// File always written next to the selected formats
pub const MISSING_FILE: &str = "missing.json";

/// Output format of one report file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Csv,
    Summary,
    Json,
    Yaml,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 4] = [
        ReportFormat::Csv,
        ReportFormat::Summary,
        ReportFormat::Json,
        ReportFormat::Yaml,
    ];

    /// Formats written when none are requested
    pub const DEFAULT: [ReportFormat; 3] =
        [ReportFormat::Csv, ReportFormat::Summary, ReportFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Summary => "summary",
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "coverage.csv",
            ReportFormat::Summary => "summary.txt",
            ReportFormat::Json => "coverage.json",
            ReportFormat::Yaml => "coverage.yaml",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "summary" | "text" | "txt" => Ok(ReportFormat::Summary),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            other => Err(format!(
                "unknown report format '{}' (expected csv, summary, json or yaml)",
                other
            )),
        }
    }
}

/// Report generator
///
/// Renders one [`CoverageReport`] into any of the [`ReportFormat`]s.
pub struct ReportGenerator<'a> {
    report: &'a CoverageReport,
    tera: Tera,
    worst: usize,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(report: &'a CoverageReport) -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self {
            report,
            tera,
            worst: DEFAULT_WORST,
        })
    }

    /// Number of missing endpoints listed in the summary
    pub fn with_worst(mut self, worst: usize) -> Self {
        self.worst = worst;
        self
    }

    /// Render one format to a string
    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Csv => tabular::render(self.report),
            ReportFormat::Summary => self.render_summary(),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self.report)?),
            ReportFormat::Yaml => Ok(serde_yaml::to_string(self.report)?),
        }
    }

    fn render_summary(&self) -> Result<String> {
        let context = summary::context(self.report, self.worst);
        self.tera
            .render("summary.txt", &context)
            .map_err(|e| CoverageError::Report(format!("Template error: {:?}", e)))
    }

    /// The `missing.json` document
    pub fn render_missing(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&missing_endpoints(self.report))?)
    }

    /// Write the requested formats plus `missing.json` into `output_dir`
    ///
    /// Returns the written paths in write order.
    pub fn write_to_directory(
        &self,
        output_dir: &Path,
        formats: &[ReportFormat],
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).map_err(|e| {
            CoverageError::Report(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let mut selected: Vec<ReportFormat> = Vec::new();
        for format in formats {
            if !selected.contains(format) {
                selected.push(*format);
            }
        }

        let mut written = Vec::new();
        for format in selected {
            let path = output_dir.join(format.file_name());
            self.write_file(&path, &self.render(format)?)?;
            written.push(path);
        }

        let path = output_dir.join(MISSING_FILE);
        self.write_file(&path, &self.render_missing()?)?;
        written.push(path);

        info!(
            dir = %output_dir.display(),
            files = written.len(),
            "reports written"
        );
        Ok(written)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        debug!(path = %path.display(), bytes = content.len(), "writing report");
        fs::write(path, content).map_err(|e| {
            CoverageError::Report(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation() {
        let report = CoverageReport::default();
        let result = ReportGenerator::new(&report);
        assert!(result.is_ok());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ReportFormat>(), Ok(ReportFormat::Csv));
        assert_eq!("yml".parse::<ReportFormat>(), Ok(ReportFormat::Yaml));
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Summary));
        assert!("pdf".parse::<ReportFormat>().is_err());

        for format in ReportFormat::ALL {
            assert_eq!(format.as_str().parse::<ReportFormat>(), Ok(format));
        }
    }

    #[test]
    fn test_empty_report_renders() {
        let report = CoverageReport::default();
        let generator = ReportGenerator::new(&report).unwrap();

        let summary = generator.render(ReportFormat::Summary).unwrap();
        assert!(summary.contains("Endpoints:    0"));
        assert!(summary.contains("(no endpoints)"));
        assert!(summary.contains("(none)"));

        let csv = generator.render(ReportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1, "only the header row: {csv}");
        assert_eq!(generator.render_missing().unwrap(), "[]");
    }
}
