//! Read-through catalog cache
//!
//! Catalogs are loaded once per record type and reused until they expire
//! or are invalidated. Concurrent misses on one type share a single load.
//! The loading side is a trait so hosts and tests can swap the file-backed
//! source for fixtures.

use super::Catalog;
use super::loader::parse_catalog;
use crate::constants::catalog;
use crate::error::{PadronError, Result};
use crate::models::RecordType;
use crate::parser::decode_latin1;
use moka::sync::Cache;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Where catalogs come from
pub trait CatalogSource: Send + Sync + fmt::Debug {
    fn load(&self, record_type: RecordType) -> Result<Catalog>;
}

/// Loads `EMP.csv` / `OSN.csv` from a reference directory
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    reference_dir: PathBuf,
}

impl FileCatalogSource {
    pub fn new(reference_dir: impl Into<PathBuf>) -> Self {
        Self {
            reference_dir: reference_dir.into(),
        }
    }

    pub fn catalog_path(&self, record_type: RecordType) -> PathBuf {
        let file_name = match record_type {
            RecordType::Emp => catalog::EMP_FILE,
            RecordType::Osn => catalog::OSN_FILE,
        };
        self.reference_dir.join(file_name)
    }
}

impl CatalogSource for FileCatalogSource {
    fn load(&self, record_type: RecordType) -> Result<Catalog> {
        let path = self.catalog_path(record_type);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            // The EMP layout is fixed; its catalog only adds optional rules
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && record_type.has_fixed_schema() => {
                debug!("No {} catalog at {}, skipping field validation", record_type, path.display());
                return Ok(Catalog::emp_without_references());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PadronError::CatalogNotFound { record_type, path });
            }
            Err(e) => return Err(PadronError::Io(e)),
        };

        info!("Loading {} reference catalog: {}", record_type, path.display());
        parse_catalog(record_type, &decode_latin1(&bytes), &path)
    }
}

/// Per-type catalog cache with a fixed time-to-live
#[derive(Debug)]
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    entries: Cache<RecordType, Arc<Catalog>>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        let entries = Cache::builder().time_to_live(ttl).build();
        Self {
            source,
            ttl,
            entries,
        }
    }

    /// File-backed cache over a reference directory
    pub fn from_dir(reference_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::new(Arc::new(FileCatalogSource::new(reference_dir)), ttl)
    }

    /// Return the cached catalog, loading it on a miss or after expiry
    pub fn get(&self, record_type: RecordType) -> Result<Arc<Catalog>> {
        let source = Arc::clone(&self.source);
        self.entries
            .try_get_with(record_type, move || source.load(record_type).map(Arc::new))
            .map_err(|error| unshare(record_type, error))
    }

    /// Drop the cached catalog of one type
    pub fn invalidate(&self, record_type: RecordType) {
        self.entries.invalidate(&record_type);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Recover a load error handed out to every caller that waited on it
fn unshare(record_type: RecordType, error: Arc<PadronError>) -> PadronError {
    Arc::try_unwrap(error).unwrap_or_else(|shared| match shared.as_ref() {
        PadronError::CatalogNotFound { record_type, path } => PadronError::CatalogNotFound {
            record_type: *record_type,
            path: path.clone(),
        },
        PadronError::CatalogFormat { path, reason } => PadronError::CatalogFormat {
            path: path.clone(),
            reason: reason.clone(),
        },
        other => PadronError::CatalogLoad {
            record_type,
            reason: other.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldReference;
    use crate::models::Schema;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    impl CatalogSource for CountingSource {
        fn load(&self, record_type: RecordType) -> Result<Catalog> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let schema = Schema::new(record_type, vec!["codigo_os".to_string()]);
            let mut reference = FieldReference::new("codigo_os");
            reference.add_code("500807");
            Ok(Catalog::new(schema, vec![reference]))
        }
    }

    #[test]
    fn test_cache_hits_reuse_loaded_catalog() {
        let source = Arc::new(CountingSource::default());
        let cache = CatalogCache::new(source.clone(), Duration::from_secs(60));

        let first = cache.get(RecordType::Osn).unwrap();
        let second = cache.get(RecordType::Osn).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_types_are_cached_separately() {
        let source = Arc::new(CountingSource::default());
        let cache = CatalogCache::new(source.clone(), Duration::from_secs(60));

        cache.get(RecordType::Osn).unwrap();
        cache.get(RecordType::Emp).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_and_expiry_force_reload() {
        let source = Arc::new(CountingSource::default());
        let cache = CatalogCache::new(source.clone(), Duration::from_secs(60));

        cache.get(RecordType::Osn).unwrap();
        cache.invalidate(RecordType::Osn);
        cache.get(RecordType::Osn).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);

        let expiring = CatalogCache::new(source.clone(), Duration::from_millis(50));
        expiring.get(RecordType::Osn).unwrap();
        std::thread::sleep(Duration::from_millis(120));
        expiring.get(RecordType::Osn).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 4);

        cache.clear();
        cache.get(RecordType::Osn).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 5);
    }

    #[derive(Debug, Default)]
    struct SlowSource {
        loads: AtomicUsize,
    }

    impl CatalogSource for SlowSource {
        fn load(&self, record_type: RecordType) -> Result<Catalog> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            Ok(Catalog::new(
                Schema::new(record_type, vec!["codigo_os".to_string()]),
                vec![],
            ))
        }
    }

    #[test]
    fn test_concurrent_misses_share_one_load() {
        let source = Arc::new(SlowSource::default());
        let cache = CatalogCache::new(source.clone(), Duration::from_secs(60));

        let catalogs: Vec<Arc<Catalog>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| cache.get(RecordType::Osn).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(catalogs.iter().all(|c| Arc::ptr_eq(c, &catalogs[0])));
    }

    #[derive(Debug)]
    struct FailingSource;

    impl CatalogSource for FailingSource {
        fn load(&self, record_type: RecordType) -> Result<Catalog> {
            Err(PadronError::CatalogNotFound {
                record_type,
                path: PathBuf::from("OSN.csv"),
            })
        }
    }

    #[test]
    fn test_load_errors_are_not_cached() {
        let cache = CatalogCache::new(Arc::new(FailingSource), Duration::from_secs(60));

        for _ in 0..2 {
            assert!(matches!(
                cache.get(RecordType::Osn),
                Err(PadronError::CatalogNotFound {
                    record_type: RecordType::Osn,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_missing_osn_catalog_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = FileCatalogSource::new(dir.path());

        match source.load(RecordType::Osn) {
            Err(PadronError::CatalogNotFound { record_type, path }) => {
                assert_eq!(record_type, RecordType::Osn);
                assert!(path.ends_with("OSN.csv"));
            }
            other => panic!("Expected CatalogNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_emp_catalog_falls_back_to_fixed_layout() {
        let dir = TempDir::new().unwrap();
        let catalog = FileCatalogSource::new(dir.path()).load(RecordType::Emp).unwrap();

        assert_eq!(catalog.schema(), &Schema::emp());
        assert!(catalog.references().is_empty());
    }

    #[test]
    fn test_latin1_catalog_file_is_decoded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("OSN.csv"),
            b"Campo;Referencias\nC\xf3digo OS;\"500807=PAMI\"\n",
        )
        .unwrap();

        let catalog = FileCatalogSource::new(dir.path()).load(RecordType::Osn).unwrap();
        assert_eq!(catalog.schema().columns(), &["codigo_os"]);
    }
}
