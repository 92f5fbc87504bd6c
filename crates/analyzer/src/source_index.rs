//! In-memory index of the implementation tree
//!
//! The tree is walked exactly once. Top-level directories are services,
//! `v<number>` children of a service are versions, and every exported async
//! function found in a remaining source file becomes a [`SourceCandidate`].
//! Matching afterwards only touches this index and its file cache.

use crate::cache::{DirCache, FileCache, FileScan};
use crate::signature::SignatureScanner;
use endpoint_coverage_common::{
    normalize_key, CoverageError, IndexWarning, ResolverConfig, Result, SourceCandidate,
};
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Version key used when a service has no version sub-directories
const UNVERSIONED: &str = "";

#[derive(Debug, Default)]
struct VersionEntry {
    dir_name: String,
    files: Vec<String>,
    /// Indices into `SourceIndex::candidates`
    candidates: Vec<usize>,
}

#[derive(Debug, Default)]
struct ServiceEntry {
    dir_name: String,
    versions: BTreeMap<String, VersionEntry>,
}

impl ServiceEntry {
    /// Fold in the layout of another directory with the same normalized name
    fn absorb(&mut self, other: ServiceEntry) {
        for (key, version) in other.versions {
            let target = self
                .versions
                .entry(key)
                .or_insert_with(|| VersionEntry {
                    dir_name: version.dir_name.clone(),
                    ..VersionEntry::default()
                });
            target.files.extend(version.files);
        }
    }
}

/// Counts for one `(service, version)` location
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub version: String,
    pub files: usize,
    pub candidates: usize,
}

/// Counts for one service directory
#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    pub service: String,
    pub versions: Vec<VersionSummary>,
}

/// Index of candidate implementation locations
#[derive(Debug)]
pub struct SourceIndex {
    root: PathBuf,
    services: BTreeMap<String, ServiceEntry>,
    candidates: Vec<SourceCandidate>,
    warnings: Vec<IndexWarning>,
    files: FileCache,
    dirs: DirCache,
}

/// Directory naming conventions and exclusions applied during the walk
struct Layout<'a> {
    config: &'a ResolverConfig,
    service_name: Regex,
    version_name: Regex,
}

impl<'a> Layout<'a> {
    fn new(config: &'a ResolverConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CoverageError::Config(e.to_string()))
        };
        Ok(Self {
            config,
            service_name: compile(r"^[A-Za-z][A-Za-z0-9_-]*$")?,
            version_name: compile(r"^[vV]\d+(?:[a-z]+\d*)?$")?,
        })
    }

    fn is_service_dir(&self, name: &str) -> bool {
        self.service_name.is_match(name)
            && !self
                .config
                .ignored_top_level
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(name))
    }

    fn is_version_dir(&self, name: &str) -> bool {
        self.version_name.is_match(name)
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.config.excluded_dirs.iter().any(|d| d == name)
    }

    fn is_source_file(&self, name: &str) -> bool {
        let has_extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.config.extensions.iter().any(|e| e == ext))
            .unwrap_or(false);

        has_extension
            && !self.config.excluded_file_names.iter().any(|n| n == name)
            && !self
                .config
                .excluded_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
    }
}

impl SourceIndex {
    /// Walk `root` once and index every service
    ///
    /// `services` restricts indexing to the named services (compared
    /// normalized); an empty slice indexes everything. Fails only when the
    /// root itself cannot be listed.
    pub fn build(root: &Path, config: &ResolverConfig, services: &[String]) -> Result<Self> {
        let unreadable = |reason: String| CoverageError::SourceRootUnreadable {
            path: root.to_path_buf(),
            reason,
        };
        let entries = fs::read_dir(root).map_err(|e| unreadable(e.to_string()))?;

        let layout = Layout::new(config)?;
        let scanner = SignatureScanner::new(&config.signature_patterns)?;
        let wanted: Vec<String> = services.iter().map(|s| normalize_key(s)).collect();

        let mut index = SourceIndex {
            root: root.to_path_buf(),
            services: BTreeMap::new(),
            candidates: Vec::new(),
            warnings: Vec::new(),
            files: FileCache::default(),
            dirs: DirCache::default(),
        };

        let mut service_dirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    index.warn(root, e.to_string());
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let path = entry.path();
            if !index.dirs.is_dir(&path) || !layout.is_service_dir(&name) {
                continue;
            }
            let key = normalize_key(&name);
            if !wanted.is_empty() && !wanted.contains(&key) {
                continue;
            }
            service_dirs.push((key, name, path));
        }
        service_dirs.sort();

        // (service key, version key, relative path, absolute path)
        let mut files: Vec<(String, String, String, PathBuf)> = Vec::new();
        for (key, name, path) in service_dirs {
            let entry = index.collect_service(&layout, &key, &name, &path, &mut files);
            match index.services.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    debug!(
                        service = %slot.get().dir_name,
                        merged = %name,
                        "merging service directories with the same normalized name"
                    );
                    slot.get_mut().absorb(entry);
                }
            }
        }

        info!(
            root = %root.display(),
            services = index.services.len(),
            files = files.len(),
            "scanning source files"
        );

        let scans: Vec<std::result::Result<Arc<FileScan>, String>> = files
            .par_iter()
            .map(|(_, _, _, abs)| index.files.get_or_try_insert(abs, || scan_file(abs, &scanner)))
            .collect();

        for ((service, version, rel, _), scan) in files.into_iter().zip(scans) {
            let scan = match scan {
                Ok(scan) => scan,
                Err(reason) => {
                    index.warn(Path::new(&rel), reason);
                    continue;
                }
            };
            let Some(location) = index
                .services
                .get(&service)
                .and_then(|s| s.versions.get(&version))
            else {
                continue;
            };
            let service_hint = rel.split('/').next().unwrap_or_default().to_string();
            let version_hint = location.dir_name.clone();

            for (line, symbol, declaration) in &scan.definitions {
                index.candidates.push(SourceCandidate {
                    file_path: rel.clone(),
                    symbol_name: symbol.clone(),
                    line_number: *line,
                    service_hint: service_hint.clone(),
                    version_hint: version_hint.clone(),
                    signature: declaration.clone(),
                });
            }
        }

        index.link_candidates();
        info!(
            candidates = index.candidates.len(),
            warnings = index.warnings.len(),
            "source index built"
        );
        Ok(index)
    }

    /// Enumerate the source files of one service and lay out its versions
    fn collect_service(
        &mut self,
        layout: &Layout<'_>,
        key: &str,
        name: &str,
        path: &Path,
        files: &mut Vec<(String, String, String, PathBuf)>,
    ) -> ServiceEntry {
        let mut entry = ServiceEntry {
            dir_name: name.to_string(),
            versions: BTreeMap::new(),
        };

        let walker = WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !layout.is_excluded_dir(&e.file_name().to_string_lossy())
            });

        for item in walker {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    let failed = e.path().unwrap_or(path).to_path_buf();
                    self.warn(&failed, e.to_string());
                    continue;
                }
            };
            // Symlinked files are read through the link; a dangling link
            // surfaces as an unreadable file.
            if !item.file_type().is_file() && !item.path_is_symlink() {
                continue;
            }
            let file_name = item.file_name().to_string_lossy();
            if !layout.is_source_file(&file_name) {
                continue;
            }

            let within = item.path().strip_prefix(path).unwrap_or(item.path());
            let mut components = within.components();
            let first = components
                .next()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .unwrap_or_default();
            let in_version_dir = components.next().is_some()
                && layout.is_version_dir(&first)
                && self.dirs.is_dir(&path.join(&first));

            let (version_key, version_dir) = if in_version_dir {
                (normalize_key(&first), first)
            } else {
                (UNVERSIONED.to_string(), String::new())
            };

            let rel = self.relative(item.path());
            let version = entry
                .versions
                .entry(version_key.clone())
                .or_insert_with(|| VersionEntry {
                    dir_name: version_dir,
                    ..VersionEntry::default()
                });
            version.files.push(rel.clone());
            files.push((key.to_string(), version_key, rel, item.path().to_path_buf()));
        }

        debug!(
            service = name,
            versions = entry.versions.len(),
            "service layout detected"
        );
        entry
    }

    /// Sort candidates deterministically and attach them to their locations
    fn link_candidates(&mut self) {
        self.candidates.sort_by(|a, b| {
            (&a.file_path, a.line_number).cmp(&(&b.file_path, b.line_number))
        });

        for (i, candidate) in self.candidates.iter().enumerate() {
            let service = normalize_key(&candidate.service_hint);
            let version = normalize_key(&candidate.version_hint);
            if let Some(location) = self
                .services
                .get_mut(&service)
                .and_then(|s| s.versions.get_mut(&version))
            {
                location.candidates.push(i);
            }
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn warn(&mut self, path: &Path, reason: String) {
        let path = self.relative(path);
        warn!(%path, %reason, "skipping unreadable source location");
        self.warnings.push(IndexWarning { path, reason });
    }

    /// Root the index was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidates for the endpoint's declared `(service, version)`
    ///
    /// An endpoint without a version is scoped to the whole service. An
    /// unknown version falls back to the unversioned location when that is
    /// the service's only one; otherwise the scope is empty.
    pub fn scope(&self, service: &str, version: &str) -> Vec<&SourceCandidate> {
        let Some(entry) = self.services.get(&normalize_key(service)) else {
            return Vec::new();
        };
        let version = normalize_key(version);
        if version.is_empty() {
            return self.service_candidates(service);
        }
        let location = entry.versions.get(&version).or_else(|| {
            if entry.versions.len() == 1 {
                entry.versions.get(UNVERSIONED)
            } else {
                None
            }
        });

        location
            .map(|l| l.candidates.iter().map(|&i| &self.candidates[i]).collect())
            .unwrap_or_default()
    }

    /// Every candidate of a service, across all versions, in index order
    pub fn service_candidates(&self, service: &str) -> Vec<&SourceCandidate> {
        let key = normalize_key(service);
        self.candidates
            .iter()
            .filter(|c| normalize_key(&c.service_hint) == key)
            .collect()
    }

    pub fn has_service(&self, service: &str) -> bool {
        self.services.contains_key(&normalize_key(service))
    }

    /// Whether the index holds the given `(service, version)` location
    pub fn has_location(&self, service: &str, version: &str) -> bool {
        self.services
            .get(&normalize_key(service))
            .map(|s| s.versions.contains_key(&normalize_key(version)))
            .unwrap_or(false)
    }

    /// Content of an indexed file, read lazily if it was never scanned
    pub fn file_content(&self, relative_path: &str) -> Option<Arc<str>> {
        let abs = self.root.join(relative_path);
        if let Some(scan) = self.files.get(&abs) {
            return Some(scan.content.clone());
        }
        let content = fs::read(&abs).ok()?;
        let scan = self
            .files
            .get_or_try_insert::<()>(&abs, || {
                Ok(FileScan {
                    content: Arc::from(String::from_utf8_lossy(&content).as_ref()),
                    definitions: Vec::new(),
                })
            })
            .ok()?;
        Some(scan.content.clone())
    }

    pub fn candidates(&self) -> &[SourceCandidate] {
        &self.candidates
    }

    pub fn warnings(&self) -> &[IndexWarning] {
        &self.warnings
    }

    /// Number of cached file scans and directory checks
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.files.len(), self.dirs.len())
    }

    /// Per-service, per-version file and candidate counts
    pub fn summary(&self) -> Vec<ServiceSummary> {
        self.services
            .values()
            .map(|service| ServiceSummary {
                service: service.dir_name.clone(),
                versions: service
                    .versions
                    .values()
                    .map(|v| VersionSummary {
                        version: v.dir_name.clone(),
                        files: v.files.len(),
                        candidates: v.candidates.len(),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn scan_file(path: &Path, scanner: &SignatureScanner) -> std::result::Result<FileScan, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let content: Arc<str> = Arc::from(String::from_utf8_lossy(&bytes).as_ref());
    let definitions = scanner.scan(&content);
    Ok(FileScan {
        content,
        definitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "alpha/v1/widget/delete.ts", "export async function deleteWidget() {}\n");
        write(root, "alpha/v2/widget/get.ts", "export async function getWidget() {}\n");
        write(root, "alpha/v1/index.ts", "export async function ignored() {}\n");
        write(root, "alpha/v1/widget/delete.test.ts", "export async function testOnly() {}\n");
        write(root, "alpha/v1/__tests__/x.ts", "export async function fixture() {}\n");
        write(root, "beta/gadget.ts", "export async function listGadgets() {}\n");
        write(root, "common/http.ts", "export async function request() {}\n");
        write(root, "README.md", "docs\n");
        temp_dir
    }

    #[test]
    fn test_build_layout() {
        let temp_dir = fixture();
        let index = SourceIndex::build(temp_dir.path(), &ResolverConfig::default(), &[]).unwrap();

        let symbols: Vec<&str> = index
            .candidates()
            .iter()
            .map(|c| c.symbol_name.as_str())
            .collect();
        assert_eq!(symbols, vec!["deleteWidget", "getWidget", "listGadgets"]);

        assert!(index.has_location("alpha", "v1"));
        assert!(index.has_location("alpha", "V2"));
        assert!(index.has_location("beta", ""));
        assert!(!index.has_service("common"));
        assert!(index.warnings().is_empty());
    }

    #[test]
    fn test_candidate_fields() {
        let temp_dir = fixture();
        let index = SourceIndex::build(temp_dir.path(), &ResolverConfig::default(), &[]).unwrap();

        let scoped = index.scope("alpha", "v1");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].file_path, "alpha/v1/widget/delete.ts");
        assert_eq!(scoped[0].line_number, 1);
        assert_eq!(scoped[0].service_hint, "alpha");
        assert_eq!(scoped[0].version_hint, "v1");
    }

    #[test]
    fn test_unversioned_service_scope() {
        let temp_dir = fixture();
        let index = SourceIndex::build(temp_dir.path(), &ResolverConfig::default(), &[]).unwrap();

        assert_eq!(index.scope("beta", "v3").len(), 1);
        assert!(index.scope("alpha", "v3").is_empty());
        assert_eq!(index.scope("alpha", "").len(), 2, "no version means the whole service");
        assert_eq!(index.scope("beta", "").len(), 1);
        assert!(index.scope("gamma", "v1").is_empty());
        assert_eq!(index.service_candidates("alpha").len(), 2);
    }

    #[test]
    fn test_service_filter() {
        let temp_dir = fixture();
        let index = SourceIndex::build(
            temp_dir.path(),
            &ResolverConfig::default(),
            &["Beta".to_string()],
        )
        .unwrap();

        assert!(!index.has_service("alpha"));
        assert_eq!(index.candidates().len(), 1);
    }

    #[test]
    fn test_file_content_is_cached() {
        let temp_dir = fixture();
        let index = SourceIndex::build(temp_dir.path(), &ResolverConfig::default(), &[]).unwrap();

        let content = index.file_content("alpha/v1/widget/delete.ts").unwrap();
        assert!(content.contains("deleteWidget"));

        fs::remove_file(temp_dir.path().join("alpha/v1/widget/delete.ts")).unwrap();
        assert!(index.file_content("alpha/v1/widget/delete.ts").is_some());
        assert!(index.file_content("alpha/v1/absent.ts").is_none());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let err = SourceIndex::build(
            &temp_dir.path().join("absent"),
            &ResolverConfig::default(),
            &[],
        )
        .unwrap_err();
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_summary() {
        let temp_dir = fixture();
        let index = SourceIndex::build(temp_dir.path(), &ResolverConfig::default(), &[]).unwrap();
        let summary = index.summary();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].service, "alpha");
        assert_eq!(summary[0].versions.len(), 2);
        assert_eq!(summary[0].versions[0].candidates, 1);
    }

    #[test]
    fn test_same_normalized_service_dirs_are_merged() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "alpha-svc/v1/a.ts", "export async function getWidget() {}\n");
        write(root, "alpha_svc/v1/b.ts", "export async function deleteWidget() {}\n");
        write(root, "alpha_svc/v2/c.ts", "export async function listWidgets() {}\n");
        let index = SourceIndex::build(root, &ResolverConfig::default(), &[]).unwrap();

        assert_eq!(index.candidates().len(), 3);
        let v1: Vec<&str> = index
            .scope("alpha-svc", "v1")
            .iter()
            .map(|c| c.symbol_name.as_str())
            .collect();
        assert_eq!(v1, vec!["getWidget", "deleteWidget"]);
        assert_eq!(index.scope("ALPHA_SVC", "v2").len(), 1);
        assert_eq!(index.service_candidates("alphasvc").len(), 3);

        let b = &index.scope("alpha_svc", "v1")[1];
        assert_eq!(b.file_path, "alpha_svc/v1/b.ts");
        assert_eq!(b.service_hint, "alpha_svc");

        let summary = index.summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].versions[0].files, 2);
    }

    #[test]
    fn test_unreadable_file_is_skipped_with_warning() {
        let temp_dir = fixture();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("alpha/v1/widget/update.ts")).unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(root.join("absent.ts"), root.join("alpha/v1/dangling.ts"))
            .unwrap();

        let index = SourceIndex::build(root, &ResolverConfig::default(), &[]).unwrap();

        let symbols: Vec<&str> = index
            .candidates()
            .iter()
            .map(|c| c.symbol_name.as_str())
            .collect();
        assert_eq!(symbols, vec!["deleteWidget", "getWidget", "listGadgets"]);

        #[cfg(unix)]
        {
            assert_eq!(index.warnings().len(), 1);
            assert_eq!(index.warnings()[0].path, "alpha/v1/dangling.ts");
            assert!(!index.warnings()[0].reason.is_empty());
        }
    }

    #[test]
    fn test_scan_file_reports_read_errors() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = SignatureScanner::new(&ResolverConfig::default().signature_patterns).unwrap();

        assert!(scan_file(&temp_dir.path().join("absent.ts"), &scanner).is_err());
        assert!(scan_file(temp_dir.path(), &scanner).is_err());
    }
}
