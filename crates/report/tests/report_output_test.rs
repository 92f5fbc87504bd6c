use endpoint_coverage_common::{
    CoverageReport, EndpointResult, EndpointSpec, EndpointStatus, Evidence, HttpMethod,
    IndexWarning, LoadWarning, MatchAmbiguity, MatchCandidate, ScoredMatch, ServiceStats,
    SourceCandidate, StrategyId,
};
use endpoint_coverage_report::{ReportFormat, ReportGenerator, MISSING_FILE};
use indexmap::IndexMap;
use std::fs;
use tempfile::TempDir;

fn spec(id: &str, service: &str, method: HttpMethod, path: &str) -> EndpointSpec {
    let mut metadata = IndexMap::new();
    metadata.insert("owner".to_string(), format!("team-{service}"));
    EndpointSpec {
        id: id.to_string(),
        display_name: format!("Endpoint {id}"),
        http_method: method,
        path: path.to_string(),
        service: service.to_string(),
        resource: String::new(),
        version: "v1".to_string(),
        doc_url: Some(format!("https://docs.example.com/{id}")),
        metadata,
        line: 2,
    }
}

fn implemented(spec: EndpointSpec, file: &str, symbol: &str) -> EndpointResult {
    let scored = ScoredMatch {
        matched: MatchCandidate {
            strategy_id: StrategyId::KeywordFromPath,
            keyword: "widget".to_string(),
            candidate: SourceCandidate {
                file_path: file.to_string(),
                symbol_name: symbol.to_string(),
                line_number: 3,
                service_hint: spec.service.clone(),
                version_hint: "v1".to_string(),
                signature: format!("export async function {symbol}()"),
            },
            raw_evidence: vec![
                Evidence::SymbolContainsKeyword {
                    keyword: "widget".to_string(),
                },
                Evidence::TransportConstruct {
                    token: "request(".to_string(),
                },
            ],
        },
        confidence: 0.9,
    };
    EndpointResult {
        spec,
        status: EndpointStatus::Implemented,
        best: Some(scored.clone()),
        considered: vec![scored],
        ambiguity: None,
    }
}

fn missing(spec: EndpointSpec) -> EndpointResult {
    EndpointResult {
        spec,
        status: EndpointStatus::Missing,
        best: None,
        considered: vec![],
        ambiguity: None,
    }
}

fn stats(results: &[&EndpointResult]) -> ServiceStats {
    let mut stats = ServiceStats::default();
    results.iter().for_each(|r| stats.record(r.status));
    stats
}

fn sample_report() -> CoverageReport {
    let a1 = implemented(
        spec("a1", "alpha", HttpMethod::Delete, "/alpha/v1/widgets/{id}"),
        "alpha/v1/widget/delete.ts",
        "deleteWidget",
    );
    let a2 = missing(spec("a2", "alpha", HttpMethod::Get, "/alpha/v1/widgets"));
    let b2 = missing(spec("b2", "beta", HttpMethod::Put, "/beta/v1/gadgets"));
    let b1 = missing(spec("b1", "beta", HttpMethod::Get, "/beta/v1/gadgets"));

    let mut report = CoverageReport::default();
    report.services.insert("alpha".to_string(), stats(&[&a1, &a2]));
    report.services.insert("beta".to_string(), stats(&[&b2, &b1]));
    report.totals = stats(&[&a1, &a2, &b2, &b1]);
    report.endpoints = vec![a1, a2, b2, b1];
    report.warnings.load.push(LoadWarning {
        line: 7,
        reason: "missing required field 'method'".to_string(),
    });
    report.warnings.index.push(IndexWarning {
        path: "alpha/v1/broken.ts".to_string(),
        reason: "stream did not contain valid UTF-8".to_string(),
    });
    report.warnings.ambiguities.push(MatchAmbiguity {
        endpoint_id: "a1".to_string(),
        confidence: 0.9,
        candidates: vec![
            "alpha/v1/widget/delete.ts:3 deleteWidget".to_string(),
            "alpha/v1/widget/remove.ts:3 removeWidget".to_string(),
        ],
    });
    report
}

#[test]
fn test_write_default_formats() {
    let temp_dir = TempDir::new().unwrap();
    let report = sample_report();
    let generator = ReportGenerator::new(&report).unwrap();

    let written = generator
        .write_to_directory(temp_dir.path(), &ReportFormat::DEFAULT)
        .unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["coverage.csv", "summary.txt", "coverage.json", MISSING_FILE]
    );
    assert!(!temp_dir.path().join("coverage.yaml").exists());
}

#[test]
fn test_csv_rows_carry_resolution_columns() {
    let report = sample_report();
    let csv = ReportGenerator::new(&report)
        .unwrap()
        .render(ReportFormat::Csv)
        .unwrap();

    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,name,method,path,service,resource,version,doc_url,owner,\
         status,confidence,matched_file,matched_line,matched_symbol"
    );
    let first = lines.next().unwrap();
    assert!(first.starts_with("a1,Endpoint a1,DELETE,/alpha/v1/widgets/{id},alpha,"));
    assert!(first.ends_with("team-alpha,implemented,0.90,alpha/v1/widget/delete.ts,3,deleteWidget"));
    let second = lines.next().unwrap();
    assert!(second.ends_with("team-alpha,missing,0.00,,,"), "{second}");
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn test_summary_sections() {
    let report = sample_report();
    let summary = ReportGenerator::new(&report)
        .unwrap()
        .with_worst(2)
        .render(ReportFormat::Summary)
        .unwrap();

    assert!(summary.contains("Rate:         25.0%"), "{summary}");

    let beta = summary.find("beta   0/2 implemented").expect("beta row");
    let alpha = summary.find("alpha  1/2 implemented").expect("alpha row");
    assert!(beta < alpha, "lowest rate first:\n{summary}");

    assert!(summary.contains("Missing endpoints (showing 2 of 3)"));
    assert!(summary.contains("[beta] PUT /beta/v1/gadgets  b2"));
    assert!(summary.contains("[beta] GET /beta/v1/gadgets  b1"));
    assert!(!summary.contains("[alpha] GET /alpha/v1/widgets"));

    assert!(summary.contains("catalog line 7: missing required field 'method'"));
    assert!(summary.contains("source alpha/v1/broken.ts:"));
    assert!(summary.contains("ambiguous match for a1"));
}

#[test]
fn test_summary_pads_non_ascii_service_names_by_character() {
    let c1 = implemented(
        spec("c1", "café", HttpMethod::Get, "/café/v1/menus"),
        "café/v1/menu.ts",
        "getMenu",
    );
    let t1 = missing(spec("t1", "tea", HttpMethod::Get, "/tea/v1/pots"));

    let mut report = CoverageReport::default();
    report.services.insert("café".to_string(), stats(&[&c1]));
    report.services.insert("tea".to_string(), stats(&[&t1]));
    report.totals = stats(&[&c1, &t1]);
    report.endpoints = vec![c1, t1];

    let summary = ReportGenerator::new(&report)
        .unwrap()
        .render(ReportFormat::Summary)
        .unwrap();
    assert!(summary.contains("\ntea   0/1 implemented"), "{summary}");
    assert!(summary.contains("\ncafé  1/1 implemented"), "{summary}");
}

#[test]
fn test_missing_list_is_sorted() {
    let temp_dir = TempDir::new().unwrap();
    let report = sample_report();
    ReportGenerator::new(&report)
        .unwrap()
        .write_to_directory(temp_dir.path(), &[ReportFormat::Yaml])
        .unwrap();

    let text = fs::read_to_string(temp_dir.path().join(MISSING_FILE)).unwrap();
    let missing: serde_json::Value = serde_json::from_str(&text).unwrap();
    let ids: Vec<&str> = missing
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a2", "b1", "b2"]);
    assert_eq!(missing[0]["displayName"], "Endpoint a2");
    assert_eq!(missing[0]["method"], "GET");
    assert_eq!(missing[0]["docUrl"], "https://docs.example.com/a2");

    let yaml = fs::read_to_string(temp_dir.path().join("coverage.yaml")).unwrap();
    let parsed: CoverageReport = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.endpoints.len(), 4);
}

#[test]
fn test_json_dump_keeps_evidence_and_is_stable() {
    let report = sample_report();
    let generator = ReportGenerator::new(&report).unwrap();

    let first = generator.render(ReportFormat::Json).unwrap();
    assert_eq!(first, generator.render(ReportFormat::Json).unwrap());

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    let evidence = &value["endpoints"][0]["considered"][0]["rawEvidence"];
    assert_eq!(evidence.as_array().unwrap().len(), 2);
    assert_eq!(evidence[1]["kind"], "transport-construct");
}
