//! Header recognition for catalog columns

use endpoint_coverage_common::normalize_key;

/// A catalog column the loader interprets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Name,
    Method,
    Path,
    Service,
    Resource,
    Version,
    DocUrl,
}

impl Column {
    const ALL: [Column; 8] = [
        Column::Id,
        Column::Name,
        Column::Method,
        Column::Path,
        Column::Service,
        Column::Resource,
        Column::Version,
        Column::DocUrl,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Method => "method",
            Column::Path => "path",
            Column::Service => "service",
            Column::Resource => "resource",
            Column::Version => "version",
            Column::DocUrl => "doc_url",
        }
    }

    /// Normalized header spellings seen in explorer exports
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Id => &["id", "apiid", "operationid", "endpointid"],
            Column::Name => &["name", "displayname", "apiname", "title", "summary"],
            Column::Method => &["method", "httpmethod", "verb"],
            Column::Path => &["path", "url", "uri", "apipath", "endpoint"],
            Column::Service => &["service", "servicename", "product", "namespace"],
            Column::Resource => &["resource", "module", "group", "category"],
            Column::Version => &["version", "apiversion"],
            Column::DocUrl => &["docurl", "doc", "documentation", "docs", "reference"],
        }
    }

    fn matches(&self, header: &str) -> bool {
        self.aliases().contains(&header)
    }
}

/// Position of each recognized column within the header row
#[derive(Debug, Default)]
pub struct ColumnMap {
    positions: Vec<(Column, usize)>,
}

impl ColumnMap {
    /// First header matching a column wins; later duplicates stay metadata
    pub fn from_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Self {
        let mut map = ColumnMap::default();
        for (i, header) in headers.enumerate() {
            let key = normalize_key(header);
            let column = Column::ALL
                .iter()
                .copied()
                .find(|c| c.matches(&key) && map.index_of(*c).is_none());
            if let Some(column) = column {
                map.positions.push((column, i));
            }
        }
        map
    }

    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, i)| *i)
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.positions.iter().any(|(_, i)| *i == index)
    }

    pub fn missing_required(&self) -> Vec<Column> {
        [Column::Service, Column::Method, Column::Path]
            .into_iter()
            .filter(|c| self.index_of(*c).is_none())
            .collect()
    }
}
