//! Line reassembly and chunk batching
//!
//! A logical record is complete once its buffered physical lines hold
//! exactly `expected_fields - 1` delimiters. Fewer means the record
//! continues on the next line; more means the group is malformed and is
//! discarded whole.

use super::encoding::decode_latin1;
use super::stats::ParseStats;
use crate::constants::{FIELD_DELIMITER, QUOTE_CHAR};
use crate::error::{PadronError, Result};
use crate::models::{Chunk, Record};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Forward-only reader yielding bounded chunks of records.
///
/// One reader covers one pass over one source; re-open the source for
/// another pass.
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    source: PathBuf,
    expected_fields: usize,
    chunk_size: usize,
    pending: Vec<String>,
    pending_delimiters: usize,
    line: Vec<u8>,
    stats: ParseStats,
    finished: bool,
}

impl ChunkReader<BufReader<File>> {
    /// Open a registry file for streaming
    pub fn open(
        path: impl AsRef<Path>,
        expected_fields: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PadronError::source_io(path, e))?;
        let mut reader = Self::new(BufReader::new(file), expected_fields, chunk_size)?;
        reader.source = path.to_path_buf();
        Ok(reader)
    }
}

impl<R: BufRead> ChunkReader<R> {
    /// Wrap any buffered byte stream
    pub fn new(reader: R, expected_fields: usize, chunk_size: usize) -> Result<Self> {
        if expected_fields == 0 {
            return Err(PadronError::configuration(
                "schema must define at least one field",
            ));
        }
        if chunk_size == 0 {
            return Err(PadronError::configuration("chunk size must be positive"));
        }

        Ok(Self {
            reader,
            source: PathBuf::from("<stream>"),
            expected_fields,
            chunk_size,
            pending: Vec::new(),
            pending_delimiters: 0,
            line: Vec::new(),
            stats: ParseStats::new(),
            finished: false,
        })
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Read one physical line without its line terminator
    fn read_line(&mut self) -> Result<Option<String>> {
        self.line.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.line)
            .map_err(|e| PadronError::source_io(&self.source, e))?;
        if read == 0 {
            return Ok(None);
        }

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
        }
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }

        Ok(Some(decode_latin1(&self.line).into_owned()))
    }

    /// Produce the next complete logical record, if any
    fn next_record(&mut self) -> Result<Option<Record>> {
        let target = self.expected_fields - 1;

        while let Some(line) = self.read_line()? {
            self.stats.lines_read += 1;

            let line = line.trim_matches(QUOTE_CHAR);
            self.pending_delimiters += line.matches(FIELD_DELIMITER).count();
            self.pending.push(line.to_string());

            if self.pending_delimiters < target {
                continue;
            }

            let record = if self.pending_delimiters == target {
                self.assemble()
            } else {
                trace!(
                    "Dropping line group of {} lines with {} delimiters (expected {})",
                    self.pending.len(),
                    self.pending_delimiters,
                    target
                );
                None
            };

            self.pending.clear();
            self.pending_delimiters = 0;

            match record {
                Some(record) => {
                    self.stats.records_parsed += 1;
                    return Ok(Some(record));
                }
                None => self.stats.groups_dropped += 1,
            }
        }

        // An unterminated group at end of stream is incomplete
        if self.pending.iter().any(|line| !line.trim().is_empty()) {
            self.stats.groups_dropped += 1;
        }
        self.pending.clear();
        self.pending_delimiters = 0;

        Ok(None)
    }

    /// Rejoin the buffered lines and split into fields
    fn assemble(&self) -> Option<Record> {
        let joined = self.pending.join("\n");
        let fields: Vec<String> = joined
            .split(FIELD_DELIMITER)
            .map(|part| part.trim().trim_matches(QUOTE_CHAR).to_string())
            .collect();

        if fields.len() == self.expected_fields {
            Some(Record::new(fields))
        } else {
            None
        }
    }
}

impl<R: BufRead> Iterator for ChunkReader<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut chunk = Chunk::with_capacity(self.chunk_size.min(4096));
        while chunk.len() < self.chunk_size {
            match self.next_record() {
                Ok(Some(record)) => chunk.push(record),
                Ok(None) => {
                    self.finished = true;
                    debug!(
                        "Finished {}: {} lines, {} records, {} dropped groups",
                        self.source.display(),
                        self.stats.lines_read,
                        self.stats.records_parsed,
                        self.stats.groups_dropped
                    );
                    break;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        if chunk.is_empty() { None } else { Some(Ok(chunk)) }
    }
}
