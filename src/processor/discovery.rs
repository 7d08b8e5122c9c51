//! Source discovery under the input root
//!
//! Candidate registry files are the `*.txt` files directly under the input
//! root, unified outputs included, listed by name.

use crate::constants::SOURCE_FILE_PATTERN;
use crate::error::{PadronError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File discovery component for registry sources
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    input_root: PathBuf,
}

impl FileDiscovery {
    pub fn new(input_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
        }
    }

    pub fn input_root(&self) -> &Path {
        &self.input_root
    }

    /// Discover candidate sources, sorted by path.
    ///
    /// A missing input root yields an empty list.
    pub fn discover_sources(&self) -> Result<Vec<PathBuf>> {
        if !self.input_root.is_dir() {
            debug!(
                "Input root {} does not exist, no sources",
                self.input_root.display()
            );
            return Ok(Vec::new());
        }

        // The root itself may contain glob metacharacters
        let root = glob::Pattern::escape(&self.input_root.to_string_lossy());
        let pattern = Path::new(&root).join(SOURCE_FILE_PATTERN);
        let entries = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| PadronError::configuration(format!("invalid source pattern: {}", e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PadronError::Io(e.into_error()))?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        debug!(
            "Found {} source file(s) in {}",
            files.len(),
            self.input_root.display()
        );
        Ok(files)
    }

    /// Resolve names relative to the input root, keeping the given order
    pub fn resolve(&self, names: &[PathBuf]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                if name.is_absolute() || name.exists() {
                    name.clone()
                } else {
                    self.input_root.join(name)
                }
            })
            .collect()
    }
}
