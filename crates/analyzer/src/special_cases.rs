//! Ordered table of irregular endpoints
//!
//! Pagination variants, token exchanges and batch operations are named in
//! ways the generic path and name rules get wrong. Each entry maps a
//! fragment of the path or display name to explicit keywords; `{resource}`
//! in a keyword is replaced with the endpoint's resource name.

use crate::keywords::{self, normalize, MIN_KEYWORD_LEN};
use endpoint_coverage_common::{normalize_key, EndpointSpec, SpecialCase};

const RESOURCE_PLACEHOLDER: &str = "{resource}";

fn builtin() -> Vec<SpecialCase> {
    vec![
        SpecialCase::new(None, "oauth/token", &["exchangetoken", "accesstoken", "gettoken"]),
        SpecialCase::new(None, "/token", &["accesstoken", "refreshtoken", "exchangetoken"]),
        SpecialCase::new(None, "/page", &["{resource}page", "page{resource}", "list{resource}"]),
        SpecialCase::new(None, "batch", &["batch{resource}", "{resource}batch", "bulk{resource}"]),
        SpecialCase::new(None, "/search", &["search{resource}", "{resource}search", "query{resource}"]),
        SpecialCase::new(None, "/count", &["count{resource}", "{resource}count"]),
        SpecialCase::new(None, "/export", &["export{resource}", "{resource}export"]),
    ]
}

/// Configured entries followed by the built-in ones
#[derive(Debug, Clone)]
pub struct SpecialCaseTable {
    entries: Vec<SpecialCase>,
}

impl SpecialCaseTable {
    pub fn new(configured: &[SpecialCase]) -> Self {
        let mut entries = configured.to_vec();
        entries.extend(builtin());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords of every entry that applies to `spec`, in table order
    pub fn keywords(&self, spec: &EndpointSpec) -> Vec<String> {
        let path = spec.path.to_lowercase();
        let name = spec.display_name.to_lowercase();
        let service = normalize_key(&spec.service);
        let resource = keywords::resource(spec);

        let mut found: Vec<String> = Vec::new();
        for entry in &self.entries {
            if let Some(only) = &entry.service {
                if normalize_key(only) != service {
                    continue;
                }
            }
            let fragment = entry.fragment.to_lowercase();
            if !path.contains(&fragment) && !name.contains(&fragment) {
                continue;
            }

            for raw in &entry.keywords {
                let expanded = if raw.contains(RESOURCE_PLACEHOLDER) {
                    match &resource {
                        Some(r) => raw.replace(RESOURCE_PLACEHOLDER, r),
                        None => continue,
                    }
                } else {
                    raw.clone()
                };
                let keyword = normalize(&expanded);
                if keyword.len() >= MIN_KEYWORD_LEN && !found.contains(&keyword) {
                    found.push(keyword);
                }
            }
        }
        found
    }
}
