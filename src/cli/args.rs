//! Command-line argument definitions for the padron analyzer
//!
//! This module defines the CLI interface using the clap derive API. Global
//! flags (configuration file, directories, verbosity) apply to every
//! subcommand.

use crate::config::AnalyzerConfig;
use crate::constants::DEFAULT_PREVIEW_ROWS;
use crate::error::{PadronError, Result};
use crate::models::RecordType;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the registry analyzer
///
/// Validates pipe-delimited health-plan beneficiary registries against their
/// reference catalogs and classifies rows into partial-plan, duplicate,
/// multi-affiliation and validation-error outputs.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "padron-analyzer",
    version,
    about = "Analyze EMP/OSN beneficiary registries for duplicates, multi-affiliation and invalid codes",
    long_about = "Streams pipe-delimited beneficiary registries in two passes with bounded row memory. \
                  Pass 1 writes partial-plan rows and field validation errors while counting duplicate \
                  keys and employer affiliations; pass 2 writes duplicate and multi-affiliation rows."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file (TOML format)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Directory holding registry sources and unified outputs
    #[arg(short = 'i', long = "input", value_name = "PATH", global = true)]
    pub input_root: Option<PathBuf>,

    /// Directory holding the EMP.csv / OSN.csv reference catalogs
    #[arg(short = 'r', long = "references", value_name = "PATH", global = true)]
    pub reference_root: Option<PathBuf>,

    /// Directory under which each analysis creates its working directory
    #[arg(long = "cache-path", value_name = "PATH", global = true)]
    pub cache_root: Option<PathBuf>,

    /// Rows per streamed chunk
    #[arg(long = "chunk-size", value_name = "ROWS", global = true)]
    pub chunk_size: Option<usize>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List candidate registry files under the input root
    List,
    /// Merge registry files into one unified file under the input root
    Unify(UnifyArgs),
    /// Run the two-pass analysis and report the classification
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct UnifyArgs {
    /// Registry type of the sources
    #[arg(short = 't', long = "type", value_enum)]
    pub record_type: RecordTypeArg,

    /// Registry files, absolute or relative to the input root
    #[arg(value_name = "FILES", required = true)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct AnalyzeArgs {
    /// Registry type of the sources
    #[arg(short = 't', long = "type", value_enum)]
    pub record_type: RecordTypeArg,

    /// Registry files, absolute or relative to the input root
    #[arg(value_name = "FILES", required = true)]
    pub sources: Vec<PathBuf>,

    /// Write the delivered zip bundle into this directory
    #[arg(short = 'a', long = "archive", value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Rows shown per output file after the run (0 disables previews)
    #[arg(long = "preview", value_name = "ROWS", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Keep the working directory instead of removing it after reporting
    #[arg(long = "keep")]
    pub keep_work_dir: bool,

    /// Output format for results
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordTypeArg {
    Emp,
    Osn,
}

impl From<RecordTypeArg> for RecordType {
    fn from(value: RecordTypeArg) -> Self {
        match value {
            RecordTypeArg::Emp => RecordType::Emp,
            RecordTypeArg::Osn => RecordType::Osn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    /// Configuration from the optional file with CLI overrides applied
    pub fn load_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(PadronError::configuration(format!(
                        "Config file does not exist: {}",
                        path.display()
                    )));
                }
                AnalyzerConfig::from_file(path)?
            }
            None => AnalyzerConfig::default(),
        };

        if let Some(input_root) = &self.input_root {
            config.input_root = input_root.clone();
        }
        if let Some(reference_root) = &self.reference_root {
            config.reference_root = reference_root.clone();
        }
        if let Some(cache_root) = &self.cache_root {
            config.cache_root = cache_root.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        config.show_progress = config.show_progress && self.show_progress();

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_command() {
        let args = Args::try_parse_from([
            "padron-analyzer",
            "-v",
            "--chunk-size",
            "100",
            "analyze",
            "--type",
            "osn",
            "a.txt",
            "b.txt",
            "--archive",
            "out",
        ])
        .unwrap();

        assert_eq!(args.get_log_level(), "debug");
        match args.command {
            Some(Commands::Analyze(analyze)) => {
                assert_eq!(RecordType::from(analyze.record_type), RecordType::Osn);
                assert_eq!(analyze.sources.len(), 2);
                assert_eq!(analyze.archive_dir, Some(PathBuf::from("out")));
                assert_eq!(analyze.preview_rows, DEFAULT_PREVIEW_ROWS);
            }
            other => panic!("Expected analyze command, got {:?}", other),
        }
    }

    #[test]
    fn test_sources_are_required() {
        assert!(Args::try_parse_from(["padron-analyzer", "unify", "--type", "emp"]).is_err());
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = Args::try_parse_from([
            "padron-analyzer",
            "--quiet",
            "--input",
            "/data/padrones",
            "--chunk-size",
            "7",
            "list",
        ])
        .unwrap();

        let config = args.load_config().unwrap();
        assert_eq!(config.input_root, PathBuf::from("/data/padrones"));
        assert_eq!(config.chunk_size, 7);
        assert!(!config.show_progress);
        assert_eq!(args.get_log_level(), "error");
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        let args = Args::try_parse_from([
            "padron-analyzer",
            "--config",
            "/definitely/not/here.toml",
            "list",
        ])
        .unwrap();
        assert!(args.load_config().is_err());
    }
}
