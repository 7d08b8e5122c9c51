//! Error handling for registry analysis operations.
//!
//! Fatal conditions only: structural parse drops and field validation
//! failures are part of normal processing and never surface here.

use crate::models::RecordType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PadronError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Failed to read source file: {path} - {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reference catalog for {record_type} not found at: {path}")]
    CatalogNotFound {
        record_type: RecordType,
        path: PathBuf,
    },

    #[error("Invalid reference catalog: {path} - {reason}")]
    CatalogFormat { path: PathBuf, reason: String },

    #[error("Failed to load {record_type} reference catalog: {reason}")]
    CatalogLoad {
        record_type: RecordType,
        reason: String,
    },

    #[error("{record_type} schema has no '{column}' column")]
    MissingColumn {
        record_type: RecordType,
        column: &'static str,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Analysis engine in state {found}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown record type: {value} (expected 'emp' or 'osn')")]
    UnknownRecordType { value: String },

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PadronError {
    /// Wrap an I/O failure on a source file, mapping NotFound to its own variant
    pub fn source_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::SourceNotFound { path }
        } else {
            Self::SourceRead { path, source }
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PadronError>;
