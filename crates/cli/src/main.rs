//! Endpoint Coverage CLI
//!
//! Command-line interface for resolving which catalog endpoints an SDK
//! source tree implements.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use endpoint_coverage_analyzer::CoverageResolver;
use endpoint_coverage_common::{CoverageReport, EndpointStatus, ResolverConfig};
use endpoint_coverage_report::{ReportFormat, ReportGenerator, DEFAULT_WORST};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "endpoint-coverage")]
#[command(version, about = "Resolve API catalog coverage of an SDK source tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every catalog endpoint against the source tree and write reports
    #[command(after_help = "EXAMPLES:\n  \
        # Resolve the whole catalog\n  \
        endpoint-coverage resolve --catalog endpoints.csv --source ./sdk/src\n\n  \
        # Two services only, summary and YAML dump\n  \
        endpoint-coverage resolve \\\n    \
        --catalog endpoints.csv \\\n    \
        --source ./sdk/src \\\n    \
        --services billing,compute \\\n    \
        --format summary,yaml \\\n    \
        --output ./coverage")]
    Resolve {
        /// Path to the endpoint catalog (CSV, or TSV by extension)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Root of the SDK source tree
        #[arg(short, long)]
        source: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./coverage")]
        output: PathBuf,

        /// Comma-separated list of services to restrict processing to
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,

        /// Comma-separated report formats: csv, summary, json, yaml
        #[arg(short, long, value_delimiter = ',')]
        format: Option<Vec<ReportFormat>>,

        /// Resolver configuration file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads for matching (defaults to one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Number of missing endpoints listed in the summary
        #[arg(long, default_value_t = DEFAULT_WORST)]
        worst: usize,
    },

    /// Index the source tree and display what was discovered
    #[command(after_help = "EXAMPLES:\n  \
        # Inspect the whole tree\n  \
        endpoint-coverage index --source ./sdk/src\n\n  \
        # One service, listing every candidate\n  \
        endpoint-coverage index --source ./sdk/src --services billing --verbose")]
    Index {
        /// Root of the SDK source tree
        #[arg(short, long)]
        source: PathBuf,

        /// Comma-separated list of services to index
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,

        /// Resolver configuration file (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Resolve {
            catalog,
            source,
            output,
            services,
            format,
            config,
            jobs,
            worst,
        } => {
            resolve_command(ResolveArgs {
                catalog: catalog.as_path(),
                source: source.as_path(),
                output: output.as_path(),
                services: services.unwrap_or_default(),
                formats: format.unwrap_or_else(|| ReportFormat::DEFAULT.to_vec()),
                config: config.as_deref(),
                jobs,
                worst,
                verbose: cli.verbose,
            })?;
        }
        Commands::Index {
            source,
            services,
            config,
        } => {
            index_command(
                source.as_path(),
                services.unwrap_or_default(),
                config.as_deref(),
                cli.verbose,
            )?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ResolverConfig> {
    match path {
        Some(path) => {
            println!("{} Loading config: {}", "→".cyan(), path.display());
            ResolverConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(ResolverConfig::default()),
    }
}

struct ResolveArgs<'a> {
    catalog: &'a Path,
    source: &'a Path,
    output: &'a Path,
    services: Vec<String>,
    formats: Vec<ReportFormat>,
    config: Option<&'a Path>,
    jobs: Option<usize>,
    worst: usize,
    verbose: bool,
}

fn resolve_command(args: ResolveArgs<'_>) -> Result<()> {
    let mut config = load_config(args.config)?;
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }

    println!(
        "{} Resolving {} against {}",
        "→".cyan(),
        args.catalog.display(),
        args.source.display()
    );
    if !args.services.is_empty() {
        println!(
            "{} Restricted to services: {}",
            "→".cyan(),
            args.services.join(", ").yellow()
        );
    }
    if args.verbose {
        let formats: Vec<String> = args.formats.iter().map(|f| f.to_string()).collect();
        println!("  Formats: {}", formats.join(", "));
        println!("  Output: {}", args.output.display());
        println!("  Jobs: {}", config.jobs);
    }

    let resolver = CoverageResolver::new(config)
        .context("Invalid resolver configuration")?
        .with_services(args.services);
    let report = resolver
        .run(args.catalog, args.source)
        .context("Failed to resolve coverage")?;

    print_totals(&report);

    println!("{} Writing reports...", "→".cyan());
    let generator = ReportGenerator::new(&report)
        .context("Failed to create report generator")?
        .with_worst(args.worst);
    let written = generator
        .write_to_directory(args.output, &args.formats)
        .context("Failed to write reports")?;

    println!("\n{}", "✓ Coverage resolved!".green().bold());
    println!("\n{}", "Generated files:".bold());
    for path in &written {
        println!("  📄 {}", path.display());
    }

    Ok(())
}

fn print_totals(report: &CoverageReport) {
    let totals = &report.totals;
    println!(
        "{} Resolved {} endpoints across {} services",
        "✓".green(),
        totals.total,
        report.services.len()
    );
    println!(
        "  {} implemented, {} partial, {} missing ({:.1}% implemented)",
        totals.implemented.to_string().green(),
        totals.partial.to_string().yellow(),
        totals.missing.to_string().red(),
        totals.rate * 100.0
    );

    let warnings = &report.warnings;
    if !warnings.is_empty() {
        eprintln!(
            "{} {} warnings ({} catalog rows skipped, {} source files unreadable, {} ambiguous matches)",
            "⚠".yellow(),
            warnings.len(),
            warnings.load.len(),
            warnings.index.len(),
            warnings.ambiguities.len()
        );
        for warning in &warnings.load {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        for warning in &warnings.index {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
    }

    let partial = report
        .endpoints
        .iter()
        .filter(|r| r.status == EndpointStatus::Partial)
        .count();
    if partial > 0 {
        println!(
            "  {} endpoints matched below the implemented threshold; see the report for evidence",
            partial
        );
    }
}

fn index_command(
    source: &Path,
    services: Vec<String>,
    config: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(config)?;
    println!("{} Indexing source tree: {}", "→".cyan(), source.display());

    let resolver = CoverageResolver::new(config)
        .context("Invalid resolver configuration")?
        .with_services(services);
    let index = resolver
        .build_index(source)
        .context("Failed to index source tree")?;

    println!("\n{}", "✓ Index built!".green().bold());
    println!("\n{}", "Services:".bold());
    let summary = index.summary();
    if summary.is_empty() {
        println!("  (no service directories found)");
    }
    for service in &summary {
        println!("  • {}", service.service.cyan());
        for version in &service.versions {
            let label = if version.version.is_empty() {
                "(unversioned)"
            } else {
                version.version.as_str()
            };
            println!(
                "    {}: {} files, {} candidates",
                label.yellow(),
                version.files,
                version.candidates
            );
        }
    }

    if verbose {
        println!("\n{}", "Candidates:".bold());
        for candidate in index.candidates() {
            println!(
                "  {}:{} {}",
                candidate.file_path,
                candidate.line_number,
                candidate.symbol_name.cyan()
            );
        }
    }

    if !index.warnings().is_empty() {
        println!("\n{}", "Warnings:".bold());
        for warning in index.warnings() {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
    }

    println!(
        "\n  Total: {} candidates in {} services",
        index.candidates().len(),
        summary.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_arguments() {
        let cli = Cli::try_parse_from([
            "endpoint-coverage",
            "resolve",
            "--catalog",
            "endpoints.csv",
            "--source",
            "sdk",
            "--services",
            "alpha,beta",
            "--format",
            "summary,yaml",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                services,
                format,
                worst,
                output,
                ..
            } => {
                assert_eq!(services.unwrap(), vec!["alpha", "beta"]);
                assert_eq!(
                    format.unwrap(),
                    vec![ReportFormat::Summary, ReportFormat::Yaml]
                );
                assert_eq!(worst, DEFAULT_WORST);
                assert_eq!(output, PathBuf::from("./coverage"));
            }
            Commands::Index { .. } => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = Cli::try_parse_from([
            "endpoint-coverage",
            "resolve",
            "-c",
            "endpoints.csv",
            "-s",
            "sdk",
            "-f",
            "pdf",
        ]);
        assert!(result.is_err());
    }
}
