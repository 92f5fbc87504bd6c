//! Endpoint catalog loading
//!
//! The catalog is a header-described CSV (or TSV) export of the vendor's API
//! explorer. Each row becomes an [`EndpointSpec`]; rows that cannot be used
//! are skipped and reported as [`LoadWarning`]s instead of failing the load.
//!
//! ## Column recognition
//!
//! Header names are compared after [`normalize_key`], so `Http Method`,
//! `http_method` and `httpMethod` all land on the method column. Columns
//! that are not recognized are carried through in `EndpointSpec::metadata`.

mod columns;

use columns::{Column, ColumnMap};
use endpoint_coverage_common::{
    normalize_key, CoverageError, EndpointSpec, HttpMethod, LoadWarning, Result,
};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Endpoints and skipped-row warnings produced by one load
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub endpoints: Vec<EndpointSpec>,
    pub warnings: Vec<LoadWarning>,
}

impl Catalog {
    /// Keep only endpoints whose service is in `services` (compared normalized)
    pub fn retain_services(&mut self, services: &[String]) {
        if services.is_empty() {
            return;
        }
        let wanted: Vec<String> = services.iter().map(|s| normalize_key(s)).collect();
        self.endpoints
            .retain(|spec| wanted.contains(&normalize_key(&spec.service)));
    }
}

/// Catalog loader over an in-memory copy of the catalog text
pub struct CatalogLoader {
    content: Vec<u8>,
    delimiter: u8,
    origin: PathBuf,
}

impl CatalogLoader {
    /// Read a catalog file; `.tsv` files are tab-delimited
    ///
    /// This is the only fallible step: a catalog that cannot be opened is a
    /// fatal input error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|e| CoverageError::CatalogUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let delimiter = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
            _ => b',',
        };

        Ok(Self {
            content,
            delimiter,
            origin: path.to_path_buf(),
        })
    }

    /// Build a loader over catalog text already in memory
    pub fn from_text(content: &str) -> Self {
        Self {
            content: content.as_bytes().to_vec(),
            delimiter: b',',
            origin: PathBuf::from("<memory>"),
        }
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse every row; never fails, bad rows become warnings
    pub fn load(&self) -> Catalog {
        let mut catalog = Catalog::default();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(self.content.as_slice());

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                catalog.warnings.push(LoadWarning {
                    line: 1,
                    reason: format!("unreadable header row: {e}"),
                });
                return catalog;
            }
        };
        let columns = ColumnMap::from_headers(headers.iter());
        for missing in columns.missing_required() {
            warn!(column = missing.label(), "catalog header lacks required column");
        }

        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                    push_warning(&mut catalog, line, format!("malformed row: {e}"));
                    continue;
                }
            };
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

            if record.len() != headers.len() {
                push_warning(
                    &mut catalog,
                    line,
                    format!(
                        "expected {} columns, found {}",
                        headers.len(),
                        record.len()
                    ),
                );
                continue;
            }

            match row_to_spec(&columns, &headers, &record, line) {
                Ok(spec) => catalog.endpoints.push(spec),
                Err(reason) => push_warning(&mut catalog, line, reason),
            }
        }

        debug!(
            origin = %self.origin.display(),
            endpoints = catalog.endpoints.len(),
            warnings = catalog.warnings.len(),
            "catalog loaded"
        );
        catalog
    }
}

fn push_warning(catalog: &mut Catalog, line: usize, reason: String) {
    warn!(line, %reason, "skipping catalog row");
    catalog.warnings.push(LoadWarning { line, reason });
}

fn row_to_spec(
    columns: &ColumnMap,
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    line: usize,
) -> std::result::Result<EndpointSpec, String> {
    let field = |column: Column| -> &str {
        columns
            .index_of(column)
            .and_then(|i| record.get(i))
            .unwrap_or("")
    };

    for column in [Column::Service, Column::Method, Column::Path] {
        if field(column).is_empty() {
            return Err(format!("missing required field '{}'", column.label()));
        }
    }

    let http_method: HttpMethod = field(Column::Method).parse()?;

    let id = match field(Column::Id) {
        "" => format!("line-{line}"),
        id => id.to_string(),
    };
    let doc_url = match field(Column::DocUrl) {
        "" => None,
        url => Some(url.to_string()),
    };

    let mut metadata = IndexMap::new();
    for (i, (header, value)) in headers.iter().zip(record.iter()).enumerate() {
        if !columns.is_consumed(i) {
            metadata.insert(header.to_string(), value.to_string());
        }
    }

    Ok(EndpointSpec {
        id,
        display_name: field(Column::Name).to_string(),
        http_method,
        path: field(Column::Path).to_string(),
        service: field(Column::Service).to_string(),
        resource: field(Column::Resource).to_string(),
        version: field(Column::Version).to_string(),
        doc_url,
        metadata,
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,name,method,path,service,resource,version,doc_url";

    #[test]
    fn test_load_valid_rows() {
        let text = format!(
            "{HEADER}\n\
             w1,Delete Widget,DELETE,/alpha/v1/widgets/{{id}},alpha,widget,v1,https://docs/w1\n\
             w2,List Widgets,get,/alpha/v1/widgets,alpha,widget,v1,\n"
        );
        let catalog = CatalogLoader::from_text(&text).load();

        assert!(catalog.warnings.is_empty(), "{:?}", catalog.warnings);
        assert_eq!(catalog.endpoints.len(), 2);

        let first = &catalog.endpoints[0];
        assert_eq!(first.id, "w1");
        assert_eq!(first.http_method, HttpMethod::Delete);
        assert_eq!(first.path, "/alpha/v1/widgets/{id}");
        assert_eq!(first.doc_url.as_deref(), Some("https://docs/w1"));
        assert_eq!(first.line, 2);

        assert_eq!(catalog.endpoints[1].http_method, HttpMethod::Get);
        assert_eq!(catalog.endpoints[1].doc_url, None);
    }

    #[test]
    fn test_missing_method_is_warning() {
        let text = format!(
            "{HEADER}\n\
             w1,Delete Widget,,/alpha/v1/widgets/{{id}},alpha,widget,v1,\n\
             w2,List Widgets,GET,/alpha/v1/widgets,alpha,widget,v1,\n"
        );
        let catalog = CatalogLoader::from_text(&text).load();

        assert_eq!(catalog.warnings.len(), 1);
        assert_eq!(catalog.warnings[0].line, 2);
        assert!(catalog.warnings[0].reason.contains("method"));
        assert_eq!(catalog.endpoints.len(), 1);
        assert_eq!(catalog.endpoints[0].id, "w2");
    }

    #[test]
    fn test_wrong_column_count_is_warning() {
        let text = format!("{HEADER}\nw1,Delete Widget,DELETE\n");
        let catalog = CatalogLoader::from_text(&text).load();

        assert!(catalog.endpoints.is_empty());
        assert_eq!(catalog.warnings.len(), 1);
        assert!(catalog.warnings[0].reason.contains("expected 8 columns"));
    }

    #[test]
    fn test_unsupported_method_is_warning() {
        let text = format!("{HEADER}\nw1,Trace,TRACE,/alpha,alpha,widget,v1,\n");
        let catalog = CatalogLoader::from_text(&text).load();

        assert!(catalog.endpoints.is_empty());
        assert!(catalog.warnings[0].reason.contains("TRACE"));
    }

    #[test]
    fn test_rows_are_not_deduplicated() {
        let row = "w1,Get Widget,GET,/alpha/v1/widgets/{id},alpha,widget,v1,";
        let text = format!("{HEADER}\n{row}\n{row}\n");
        let catalog = CatalogLoader::from_text(&text).load();
        assert_eq!(catalog.endpoints.len(), 2);
    }

    #[test]
    fn test_extra_columns_become_metadata() {
        let text = "API Name,HTTP Method,Path,Service,Owner,Tier\n\
                    创建应用,POST,/apps,apps,team-a,gold\n";
        let catalog = CatalogLoader::from_text(text).load();

        let spec = &catalog.endpoints[0];
        assert_eq!(spec.display_name, "创建应用");
        assert_eq!(spec.id, "line-2");
        assert_eq!(
            spec.metadata.keys().collect::<Vec<_>>(),
            vec!["Owner", "Tier"]
        );
        assert_eq!(spec.metadata["Tier"], "gold");
    }

    #[test]
    fn test_retain_services() {
        let text = format!(
            "{HEADER}\n\
             a,A,GET,/a,alpha,x,v1,\n\
             b,B,GET,/b,Beta,x,v1,\n"
        );
        let mut catalog = CatalogLoader::from_text(&text).load();
        catalog.retain_services(&["beta".to_string()]);

        assert_eq!(catalog.endpoints.len(), 1);
        assert_eq!(catalog.endpoints[0].id, "b");
    }

    #[test]
    fn test_tab_delimiter() {
        let text = "id\tmethod\tpath\tservice\nx\tPUT\t/x\tsvc\n";
        let catalog = CatalogLoader::from_text(text).with_delimiter(b'\t').load();
        assert_eq!(catalog.endpoints.len(), 1);
        assert_eq!(catalog.endpoints[0].http_method, HttpMethod::Put);
    }
}
