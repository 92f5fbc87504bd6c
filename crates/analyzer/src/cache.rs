//! Shared read caches for one resolver run
//!
//! Entries are written once and never replaced, so readers on other worker
//! threads only ever observe complete values.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of scanning one source file
#[derive(Debug)]
pub struct FileScan {
    /// File text, lossily decoded
    pub content: Arc<str>,
    /// `(line, symbol, declaration)` for every signature match
    pub definitions: Vec<(usize, String, String)>,
}

/// Per-file scan results keyed by absolute path
#[derive(Debug, Default)]
pub struct FileCache {
    entries: RwLock<HashMap<PathBuf, Arc<FileScan>>>,
}

impl FileCache {
    pub fn get(&self, path: &Path) -> Option<Arc<FileScan>> {
        self.entries.read().get(path).cloned()
    }

    /// Return the cached scan or compute it; `compute` errors are not cached
    pub fn get_or_try_insert<E>(
        &self,
        path: &Path,
        compute: impl FnOnce() -> Result<FileScan, E>,
    ) -> Result<Arc<FileScan>, E> {
        if let Some(hit) = self.get(path) {
            return Ok(hit);
        }
        let scan = Arc::new(compute()?);
        let mut entries = self.entries.write();
        Ok(entries
            .entry(path.to_path_buf())
            .or_insert(scan)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Memoized directory existence checks
#[derive(Debug, Default)]
pub struct DirCache {
    entries: RwLock<HashMap<PathBuf, bool>>,
}

impl DirCache {
    pub fn is_dir(&self, path: &Path) -> bool {
        if let Some(known) = self.entries.read().get(path) {
            return *known;
        }
        let exists = path.is_dir();
        self.entries.write().insert(path.to_path_buf(), exists);
        exists
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_file_cache_computes_once() {
        let cache = FileCache::default();
        let calls = Cell::new(0);
        let path = Path::new("/tmp/widget.ts");

        for _ in 0..3 {
            let scan = cache
                .get_or_try_insert::<()>(path, || {
                    calls.set(calls.get() + 1);
                    Ok(FileScan {
                        content: Arc::from("export async function a() {}"),
                        definitions: vec![(1, "a".to_string(), String::new())],
                    })
                })
                .unwrap();
            assert_eq!(scan.definitions.len(), 1);
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_file_cache_skips_failures() {
        let cache = FileCache::default();
        let path = Path::new("/tmp/broken.ts");

        let result = cache.get_or_try_insert(path, || Err("denied"));
        assert_eq!(result.unwrap_err(), "denied");
        assert!(cache.get(path).is_none());
    }

    #[test]
    fn test_dir_cache() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cache = DirCache::default();

        assert!(cache.is_dir(temp_dir.path()));
        assert!(!cache.is_dir(&temp_dir.path().join("absent")));
        assert!(cache.is_dir(temp_dir.path()));
        assert_eq!(cache.len(), 2);
    }
}
