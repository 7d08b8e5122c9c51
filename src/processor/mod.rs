//! Analysis entry points with modular architecture.
//!
//! [`PadronProcessor`] is what a host calls: it resolves sources, fetches
//! the reference catalog through the shared cache, gives each run its own
//! working directory and hands the streaming work to the specialized
//! modules:
//!
//! - [`discovery`] - candidate sources under the input root
//! - [`engine`] - the two-pass classification state machine
//! - [`aggregates`] - duplicate-key counter and affiliation map
//! - [`validation`] - catalog-driven field checks
//! - [`writer`] - classification sinks
//! - [`unify`] - merged registry output
//! - [`monitor`] - memory pressure sampling

pub mod aggregates;
pub mod discovery;
pub mod engine;
pub mod monitor;
pub mod unify;
pub mod validation;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::FileDiscovery;
use self::engine::AnalysisEngine;
use self::unify::{UnifyOutcome, unified_file_path, unify_sources};

use crate::catalog::CatalogCache;
use crate::config::AnalyzerConfig;
use crate::constants::sinks;
use crate::error::{PadronError, Result};
use crate::models::RecordType;
use crate::summary::Summary;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Main entry point for registry unification and analysis
#[derive(Debug, Clone)]
pub struct PadronProcessor {
    config: AnalyzerConfig,
    catalogs: Arc<CatalogCache>,
    file_discovery: FileDiscovery,
    cancellation: CancellationToken,
}

impl PadronProcessor {
    /// Create a processor with a file-backed catalog cache
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let catalogs = Arc::new(CatalogCache::from_dir(
            &config.reference_root,
            config.cache_ttl(),
        ));

        Ok(Self {
            file_discovery: FileDiscovery::new(&config.input_root),
            catalogs,
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Share a catalog cache across processors, or substitute fixtures
    pub fn with_catalog_cache(mut self, catalogs: Arc<CatalogCache>) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Cancel running work at the next chunk boundary through this token
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn catalogs(&self) -> &Arc<CatalogCache> {
        &self.catalogs
    }

    /// Candidate sources under the input root
    pub fn list_sources(&self) -> Result<Vec<PathBuf>> {
        self.file_discovery.discover_sources()
    }

    /// Resolve source names relative to the input root
    pub fn resolve_sources(&self, sources: &[PathBuf]) -> Vec<PathBuf> {
        self.file_discovery.resolve(sources)
    }

    /// Merge the sources into one unified file under the input root.
    ///
    /// Returns `Ok(None)` when no source was selected.
    pub fn unify(
        &self,
        sources: &[PathBuf],
        record_type: RecordType,
    ) -> Result<Option<UnifyOutcome>> {
        if sources.is_empty() {
            info!("No sources selected, nothing to unify");
            return Ok(None);
        }

        let sources = self.resolve_sources(sources);
        check_sources(&sources)?;
        let catalog = self.catalogs.get(record_type)?;

        std::fs::create_dir_all(&self.config.input_root)?;
        let destination = unified_file_path(&self.config.input_root);
        unify_sources(
            &sources,
            catalog.schema(),
            &destination,
            self.config.chunk_size,
            &self.cancellation,
        )
        .map(Some)
    }

    /// Run the two-pass analysis over the sources, in the given order.
    ///
    /// Returns `Ok(None)` when no source was selected. A failed run leaves no
    /// working directory behind.
    pub fn analyze(&self, sources: &[PathBuf], record_type: RecordType) -> Result<Option<Summary>> {
        if sources.is_empty() {
            info!("No sources selected, nothing to analyze");
            return Ok(None);
        }

        let sources = self.resolve_sources(sources);
        check_sources(&sources)?;
        let catalog = self.catalogs.get(record_type)?;

        let work_dir = self.create_work_dir()?;
        info!(
            "Analyzing {} {} source(s) in {}",
            sources.len(),
            record_type,
            work_dir.display()
        );

        let result = AnalysisEngine::new(catalog, sources, work_dir.clone(), &self.config)
            .and_then(|engine| engine.with_cancellation(self.cancellation.clone()).run());

        match result {
            Ok(summary) => Ok(Some(summary)),
            Err(e) => {
                if let Err(remove_error) = std::fs::remove_dir_all(&work_dir) {
                    warn!(
                        "Could not remove working directory {}: {}",
                        work_dir.display(),
                        remove_error
                    );
                }
                Err(e)
            }
        }
    }

    /// Run [`Self::analyze`] on the blocking pool
    pub async fn analyze_in_background(
        &self,
        sources: Vec<PathBuf>,
        record_type: RecordType,
    ) -> Result<Option<Summary>> {
        let processor = self.clone();
        task::spawn_blocking(move || processor.analyze(&sources, record_type)).await?
    }

    /// Run [`Self::unify`] on the blocking pool
    pub async fn unify_in_background(
        &self,
        sources: Vec<PathBuf>,
        record_type: RecordType,
    ) -> Result<Option<UnifyOutcome>> {
        let processor = self.clone();
        task::spawn_blocking(move || processor.unify(&sources, record_type)).await?
    }

    /// Fresh `anal_*` directory under the cache root, owned by one run
    fn create_work_dir(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.cache_root)?;
        let work_dir = tempfile::Builder::new()
            .prefix(sinks::WORK_DIR_PREFIX)
            .tempdir_in(&self.config.cache_root)?
            .keep();
        debug!("Created working directory {}", work_dir.display());
        Ok(work_dir)
    }
}

/// Every source must be a readable file before any work begins
fn check_sources(sources: &[PathBuf]) -> Result<()> {
    for source in sources {
        if !source.is_file() {
            return Err(PadronError::SourceNotFound {
                path: source.clone(),
            });
        }
    }
    Ok(())
}
