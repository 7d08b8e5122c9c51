//! Unified registry output
//!
//! Concatenates every selected source into one pipe-delimited file in the
//! registry code page, one normalized record per line and no header. The
//! result is itself a valid analysis source.

use crate::constants::{FIELD_DELIMITER, sinks};
use crate::error::{PadronError, Result};
use crate::models::Schema;
use crate::normalizer::FieldNormalizer;
use crate::parser::{ChunkReader, ParseStats, encode_latin1};

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where the unified file was written and how many rows it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifyOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub parse: ParseStats,
}

/// `unif_<unix seconds>.txt` under `output_dir`
pub fn unified_file_path(output_dir: &Path) -> PathBuf {
    let timestamp = chrono::Utc::now().timestamp();
    output_dir.join(format!("{}{}.txt", sinks::UNIFIED_PREFIX, timestamp))
}

/// Write every record of `sources`, in order, to `destination`.
///
/// A partially written file is removed when any source fails.
pub fn unify_sources(
    sources: &[PathBuf],
    schema: &Schema,
    destination: &Path,
    chunk_size: usize,
    cancellation: &CancellationToken,
) -> Result<UnifyOutcome> {
    info!(
        "Unifying {} {} source(s) into {}",
        sources.len(),
        schema.record_type(),
        destination.display()
    );

    match write_unified(sources, schema, destination, chunk_size, cancellation) {
        Ok(outcome) => {
            info!(
                "Unified {} rows into {}",
                outcome.rows,
                outcome.path.display()
            );
            Ok(outcome)
        }
        Err(e) => {
            if destination.exists() {
                if let Err(remove_error) = std::fs::remove_file(destination) {
                    warn!(
                        "Could not remove partial unified file {}: {}",
                        destination.display(),
                        remove_error
                    );
                }
            }
            Err(e)
        }
    }
}

fn write_unified(
    sources: &[PathBuf],
    schema: &Schema,
    destination: &Path,
    chunk_size: usize,
    cancellation: &CancellationToken,
) -> Result<UnifyOutcome> {
    let normalizer = FieldNormalizer::new(schema);
    let mut writer = BufWriter::new(File::create(destination)?);
    let mut stats = ParseStats::new();
    let mut rows = 0usize;
    let mut line = String::new();

    for source in sources {
        debug!("Unify: reading {}", source.display());
        let mut reader = ChunkReader::open(source, schema.width(), chunk_size)?;
        loop {
            if cancellation.is_cancelled() {
                return Err(PadronError::Cancelled);
            }
            let Some(chunk) = reader.next() else {
                break;
            };

            for record in normalizer.normalize(chunk?).iter() {
                line.clear();
                for (position, value) in record.fields().iter().enumerate() {
                    if position > 0 {
                        line.push(FIELD_DELIMITER);
                    }
                    line.push_str(value);
                }
                line.push('\n');
                writer.write_all(&encode_latin1(&line))?;
                rows += 1;
            }
        }
        stats.merge(reader.stats());
    }

    writer.flush()?;
    Ok(UnifyOutcome {
        path: destination.to_path_buf(),
        rows,
        parse: stats,
    })
}
