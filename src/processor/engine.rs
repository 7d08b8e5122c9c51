//! Two-pass analysis engine
//!
//! Pass 1 streams every source once, writing the rows that can be decided
//! on their own (partial-plan rows and validation failures) while building
//! the duplicate-key counter and the affiliation map. Only once every chunk
//! of every source has been observed are the aggregates frozen; pass 2 then
//! re-streams the same sources and writes the duplicate and
//! multi-affiliation rows.
//!
//! The engine is a strict state machine:
//!
//! ```text
//! Idle -> Pass1Running -> Pass1Complete -> Pass2Running -> Done
//!             |                                |
//!             +------------> Failed <----------+
//! ```

use crate::catalog::Catalog;
use crate::config::AnalyzerConfig;
use crate::constants::{DISTINGUISHED_INSURER, PARTIAL_PLAN_MARKER, columns};
use crate::error::{PadronError, Result};
use crate::models::{Chunk, Record, RecordType, Schema};
use crate::normalizer::FieldNormalizer;
use crate::parser::{ChunkReader, ParseStats};
use crate::processor::aggregates::{AffiliationMap, DuplicateKeyCounter, MultiAffiliationSet};
use crate::processor::monitor::MemoryMonitor;
use crate::processor::validation::FieldValidator;
use crate::processor::writer::SinkSet;
use crate::summary::{Bucket, Summary};

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Pass1Running,
    Pass1Complete,
    Pass2Running,
    Done,
    Failed,
}

impl EngineState {
    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Idle => "Idle",
            EngineState::Pass1Running => "Pass1Running",
            EngineState::Pass1Complete => "Pass1Complete",
            EngineState::Pass2Running => "Pass2Running",
            EngineState::Done => "Done",
            EngineState::Failed => "Failed",
        }
    }
}

/// Column positions the classification reads, resolved once per run
#[derive(Debug, Clone, Copy)]
enum Layout {
    Emp {
        plan_type: usize,
    },
    Osn {
        beneficiary: usize,
        insurer: usize,
        employer: usize,
    },
}

impl Layout {
    fn resolve(schema: &Schema) -> Result<Self> {
        let record_type = schema.record_type();
        let index = |column: &'static str| {
            schema
                .index_of(column)
                .ok_or(PadronError::MissingColumn { record_type, column })
        };

        match record_type {
            RecordType::Emp => Ok(Layout::Emp {
                plan_type: index(columns::PLAN_TYPE)?,
            }),
            RecordType::Osn => Ok(Layout::Osn {
                beneficiary: index(columns::BENEFICIARY_ID)?,
                insurer: index(columns::INSURER_CODE)?,
                employer: index(columns::EMPLOYER_ID)?,
            }),
        }
    }

    fn bucket(&self, record: &Record) -> Bucket {
        match *self {
            Layout::Emp { .. } => Bucket::Emp,
            Layout::Osn { insurer, .. } => {
                if field(record, insurer).trim() == DISTINGUISHED_INSURER {
                    Bucket::Distinguished
                } else {
                    Bucket::Other
                }
            }
        }
    }
}

fn field(record: &Record, index: usize) -> &str {
    record.get(index).unwrap_or_default()
}

/// One analysis run over an ordered list of sources
#[derive(Debug)]
pub struct AnalysisEngine {
    state: EngineState,
    catalog: Arc<Catalog>,
    layout: Layout,
    normalizer: FieldNormalizer,
    validator: FieldValidator,
    sinks: SinkSet,
    duplicates: DuplicateKeyCounter,
    affiliations: AffiliationMap,
    multi_affiliation: MultiAffiliationSet,
    summary: Summary,
    chunk_size: usize,
    cancellation: CancellationToken,
    monitor: MemoryMonitor,
    progress: ProgressBar,
}

impl AnalysisEngine {
    /// Prepare a run writing its sinks under `work_dir`
    pub fn new(
        catalog: Arc<Catalog>,
        sources: Vec<PathBuf>,
        work_dir: PathBuf,
        config: &AnalyzerConfig,
    ) -> Result<Self> {
        let schema = catalog.schema();
        if schema.width() == 0 {
            return Err(PadronError::configuration(format!(
                "{} schema defines no fields",
                schema.record_type()
            )));
        }

        let layout = Layout::resolve(schema)?;
        let summary = Summary::new(schema.record_type(), sources, work_dir);
        let sinks = SinkSet::new(&summary.sinks, schema);

        Ok(Self {
            state: EngineState::Idle,
            layout,
            normalizer: FieldNormalizer::new(schema),
            validator: FieldValidator::from_catalog(&catalog),
            duplicates: DuplicateKeyCounter::new(schema.key_width()),
            affiliations: AffiliationMap::new(),
            multi_affiliation: MultiAffiliationSet::default(),
            sinks,
            summary,
            chunk_size: config.chunk_size,
            cancellation: CancellationToken::new(),
            monitor: MemoryMonitor::new(config.memory_threshold),
            progress: create_progress(config.show_progress),
            catalog,
        })
    }

    /// Stop the run at the next chunk boundary once the token is cancelled
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn record_type(&self) -> RecordType {
        self.catalog.record_type()
    }

    /// Totals accumulated so far
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Run both passes and hand back the summary
    pub fn run(mut self) -> Result<Summary> {
        self.run_pass1()?;
        self.run_pass2()?;
        self.finish()
    }

    /// Stream every source, write immediately decidable rows and build the aggregates
    pub fn run_pass1(&mut self) -> Result<()> {
        self.expect_state(EngineState::Idle)?;
        self.state = EngineState::Pass1Running;
        info!(
            "Pass 1 over {} {} source(s)",
            self.summary.sources.len(),
            self.record_type()
        );

        let start_time = Instant::now();
        match self.stream_sources("Pass 1", Self::observe_chunk) {
            Ok(stats) => {
                if stats.has_drops() {
                    warn!(
                        "Dropped {} malformed line group(s) while parsing",
                        stats.groups_dropped
                    );
                }
                self.summary.parse = stats;
            }
            Err(e) => return Err(self.fail(e)),
        }

        let affiliations = std::mem::take(&mut self.affiliations);
        self.multi_affiliation = affiliations.into_multi_affiliation();
        self.state = EngineState::Pass1Complete;

        info!(
            "Pass 1 complete in {:.2}s: {} rows, {} distinct keys ({} duplicated), {} multi-affiliation pair(s)",
            start_time.elapsed().as_secs_f64(),
            self.summary.total_rows(),
            self.duplicates.len(),
            self.duplicates.duplicate_key_count(),
            self.multi_affiliation.len()
        );
        Ok(())
    }

    /// Re-stream every source and write the rows that depend on the full dataset
    pub fn run_pass2(&mut self) -> Result<()> {
        self.expect_state(EngineState::Pass1Complete)?;
        self.state = EngineState::Pass2Running;
        info!("Pass 2 over {} source(s)", self.summary.sources.len());

        let start_time = Instant::now();
        if let Err(e) = self.stream_sources("Pass 2", Self::classify_chunk) {
            return Err(self.fail(e));
        }
        if let Err(e) = self.sinks.finish() {
            return Err(self.fail(e));
        }
        self.state = EngineState::Done;

        info!(
            "Pass 2 complete in {:.2}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Consume a finished run
    pub fn finish(self) -> Result<Summary> {
        self.expect_state(EngineState::Done)?;
        self.progress.finish_and_clear();
        Ok(self.summary)
    }

    fn expect_state(&self, expected: EngineState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PadronError::InvalidState {
                expected: expected.name(),
                found: self.state.name(),
            })
        }
    }

    fn fail(&mut self, error: PadronError) -> PadronError {
        self.state = EngineState::Failed;
        self.progress.abandon();
        // Sinks of a failed run are discarded with the working directory
        let _ = self.sinks.finish();
        error
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            info!("Analysis cancelled");
            return Err(PadronError::Cancelled);
        }
        Ok(())
    }

    /// Parse and normalize every source in order, handing each chunk to `visit`
    fn stream_sources<F>(&mut self, pass: &str, mut visit: F) -> Result<ParseStats>
    where
        F: FnMut(&mut Self, &Chunk) -> Result<()>,
    {
        let sources = self.summary.sources.clone();
        let width = self.catalog.schema().width();
        let mut stats = ParseStats::new();

        self.progress.set_position(0);
        for source in &sources {
            self.check_cancelled()?;
            self.progress
                .set_message(format!("{}: {}", pass, display_name(source)));
            debug!("{}: reading {}", pass, source.display());

            let mut reader = ChunkReader::open(source, width, self.chunk_size)?;
            loop {
                self.check_cancelled()?;
                let Some(chunk) = reader.next() else {
                    break;
                };
                let chunk = self.normalizer.normalize(chunk?);
                visit(self, &chunk)?;
                self.progress.inc(chunk.len() as u64);
            }
            stats.merge(reader.stats());

            if self.monitor.is_under_pressure() {
                warn!(
                    "Memory usage above {:.0}% during {}: {} duplicate keys, {} affiliation pairs held",
                    self.monitor.threshold() * 100.0,
                    pass,
                    self.duplicates.len(),
                    self.affiliation_pairs()
                );
            }
        }

        Ok(stats)
    }

    /// Affiliation pairs currently held: the full map during pass 1, only
    /// the multi-affiliation set afterwards
    pub(crate) fn affiliation_pairs(&self) -> usize {
        match self.state {
            EngineState::Pass1Running => self.affiliations.len(),
            _ => self.multi_affiliation.len(),
        }
    }

    fn observe_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        match self.layout {
            Layout::Emp { plan_type } => {
                self.summary.emp.total += chunk.len();
                let partial_plan = chunk
                    .iter()
                    .filter(|record| field(record, plan_type).trim() == PARTIAL_PLAN_MARKER);
                self.summary.emp.flagged += self.sinks.partial_plan.append(partial_plan, None)?;
            }
            Layout::Osn {
                beneficiary,
                insurer,
                employer,
            } => {
                for record in chunk {
                    let bucket = self.layout.bucket(record);
                    self.summary.totals_mut(bucket).total += 1;
                    self.affiliations.observe(
                        field(record, beneficiary),
                        field(record, insurer),
                        field(record, employer),
                    );
                }
            }
        }

        for record in chunk {
            self.duplicates.observe(record);
        }

        for failure in self.validator.failures(chunk) {
            for record in &failure.records {
                let bucket = self.layout.bucket(record);
                self.summary.totals_mut(bucket).errors += 1;
            }
            self.sinks
                .errors
                .append(failure.records.iter().copied(), Some(failure.field))?;
        }

        debug!("Pass 1: observed chunk of {} rows", chunk.len());
        Ok(())
    }

    fn classify_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        if let Layout::Osn {
            beneficiary,
            insurer,
            ..
        } = self.layout
        {
            let mut distinguished = Vec::new();
            let mut other = Vec::new();
            for record in chunk {
                if !self
                    .multi_affiliation
                    .contains(field(record, beneficiary), field(record, insurer))
                {
                    continue;
                }
                match self.layout.bucket(record) {
                    Bucket::Distinguished => distinguished.push(record),
                    _ => other.push(record),
                }
            }
            self.summary.distinguished.flagged +=
                self.sinks.multi_distinguished.append(distinguished, None)?;
            self.summary.other.flagged += self.sinks.multi_other.append(other, None)?;
        }

        let duplicates: Vec<&Record> = chunk
            .iter()
            .filter(|record| self.duplicates.is_duplicate(record))
            .collect();
        for record in &duplicates {
            let bucket = self.layout.bucket(record);
            self.summary.totals_mut(bucket).duplicates += 1;
        }
        self.sinks.duplicates.append(duplicates, None)?;

        debug!("Pass 2: classified chunk of {} rows", chunk.len());
        Ok(())
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn create_progress(show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg} ({pos} rows)")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}
