//! Configuration management and validation.
//!
//! Provides the directories, streaming and cache parameters of an analysis
//! host. Values come from defaults, an optional TOML file and finally
//! command-line overrides.

use crate::constants::{
    APP_CACHE_NAME, DEFAULT_CACHE_DIR, DEFAULT_CACHE_TTL_SECS, DEFAULT_CHUNK_SIZE,
    DEFAULT_INPUT_DIR, DEFAULT_MEMORY_THRESHOLD, DEFAULT_REFERENCE_DIR,
};
use crate::error::{PadronError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Global configuration for registry analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory holding registry sources and unified outputs
    pub input_root: PathBuf,

    /// Directory holding the `EMP.csv` / `OSN.csv` reference catalogs
    pub reference_root: PathBuf,

    /// Directory under which each run creates its working directory
    pub cache_root: PathBuf,

    /// Rows per streamed chunk
    pub chunk_size: usize,

    /// Lifetime of cached reference catalogs in seconds
    pub cache_ttl_secs: u64,

    /// Show a spinner while passes run
    pub show_progress: bool,

    /// Fraction of system memory above which a warning is logged
    pub memory_threshold: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let cache_root = dirs::cache_dir()
            .map(|dir| dir.join(APP_CACHE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_DIR),
            reference_root: PathBuf::from(DEFAULT_REFERENCE_DIR),
            cache_root,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            show_progress: true,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
        }
    }
}

impl AnalyzerConfig {
    /// Load a TOML configuration file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PadronError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn with_input_root(mut self, input_root: impl Into<PathBuf>) -> Self {
        self.input_root = input_root.into();
        self
    }

    pub fn with_reference_root(mut self, reference_root: impl Into<PathBuf>) -> Self {
        self.reference_root = reference_root.into();
        self
    }

    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_memory_threshold(mut self, memory_threshold: f64) -> Self {
        self.memory_threshold = memory_threshold;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PadronError::configuration("chunk_size must be positive"));
        }
        if !(self.memory_threshold > 0.0 && self.memory_threshold <= 1.0) {
            return Err(PadronError::configuration(format!(
                "memory_threshold must be in (0, 1], got {}",
                self.memory_threshold
            )));
        }
        Ok(())
    }
}
