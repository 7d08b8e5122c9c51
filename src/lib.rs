//! Padron Analyzer Library
//!
//! Streaming validation and classification of pipe-delimited health-plan
//! beneficiary registries (types EMP and OSN).
//!
//! This library provides tools for:
//! - Parsing registry files with multi-line record reassembly and a
//!   deterministic drop policy for malformed line groups
//! - Loading reference catalogs that define schemas and accepted codes
//! - Two-pass analysis: partial-plan rows, field validation errors,
//!   duplicate keys and multi-employer affiliations
//! - Unifying sources into one registry file
//! - Bundling the classification outputs and summary reports into a zip
//!
//! ```no_run
//! use padron_analyzer::{AnalyzerConfig, PadronProcessor, RecordType};
//! use std::path::PathBuf;
//!
//! # fn main() -> padron_analyzer::Result<()> {
//! let processor = PadronProcessor::new(AnalyzerConfig::default())?;
//! let sources = vec![PathBuf::from("padron_osn.txt")];
//! if let Some(summary) = processor.analyze(&sources, RecordType::Osn)? {
//!     println!("{} rows", summary.total_rows());
//!     summary.cleanup()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod processor;
pub mod summary;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use archive::build_archive;
pub use config::AnalyzerConfig;
pub use error::{PadronError, Result};
pub use models::RecordType;
pub use processor::PadronProcessor;
pub use summary::Summary;
