use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use crate::analyzers::types::MonthlyMetric;
use crate::error::{PipelineError, Result};
use crate::output::load_processed;

struct CachedTable {
    modified: SystemTime,
    rows: Arc<[MonthlyMetric]>,
}

/// In-memory copy of the processed table, keyed by file path and
/// modification time.
///
/// [`TableCache::get`] reloads only when the file's mtime differs from the
/// cached one; [`TableCache::invalidate`] forces the next `get` to reload.
pub struct TableCache {
    path: PathBuf,
    entry: Option<CachedTable>,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entry: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }

    /// Returns the table, loading it from disk if it is not cached or the
    /// file changed since it was cached.
    pub fn get(&mut self) -> Result<Arc<[MonthlyMetric]>> {
        let modified = match fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.entry = None;
                return Err(PipelineError::FileNotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(entry) = &self.entry {
            if entry.modified == modified {
                debug!(path = %self.path.display(), "Processed table served from cache");
                return Ok(Arc::clone(&entry.rows));
            }
        }

        let rows: Arc<[MonthlyMetric]> = load_processed(&self.path)?.into();
        debug!(path = %self.path.display(), rows = rows.len(), "Processed table loaded");
        self.entry = Some(CachedTable {
            modified,
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Drops the cached table and loads it again.
    pub fn refresh(&mut self) -> Result<Arc<[MonthlyMetric]>> {
        self.invalidate();
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::save_processed;
    use std::fs::File;
    use std::time::Duration;

    fn temp_table(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let _ = fs::remove_file(&path);
        save_processed(&path, &[]).unwrap();
        path
    }

    #[test]
    fn test_get_serves_cached_table() {
        let path = temp_table("nvdb_traffic_insights_cache_hit.csv");
        let mut cache = TableCache::new(&path);
        assert!(!cache.is_cached());

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(cache.is_cached());
        assert!(Arc::ptr_eq(&first, &second));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_refresh_reloads() {
        let path = temp_table("nvdb_traffic_insights_cache_refresh.csv");
        let mut cache = TableCache::new(&path);

        let first = cache.get().unwrap();
        cache.invalidate();
        assert!(!cache.is_cached());
        let second = cache.refresh().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_modified_file_is_reloaded() {
        let path = temp_table("nvdb_traffic_insights_cache_mtime.csv");
        let mut cache = TableCache::new(&path);
        let first = cache.get().unwrap();

        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(120))
            .unwrap();

        let second = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_clears_cache() {
        let path = temp_table("nvdb_traffic_insights_cache_missing.csv");
        let mut cache = TableCache::new(&path);
        cache.get().unwrap();

        fs::remove_file(&path).unwrap();
        let err = cache.get().unwrap_err();
        assert!(err.is_file_not_found());
        assert!(!cache.is_cached());
    }
}
