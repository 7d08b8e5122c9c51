//! Classification sink writing
//!
//! Each sink is an append-only, pipe-delimited file with a single header
//! line. Values are escaped with a backslash so that no raw delimiter,
//! quote or line break ever appears inside a field.

use crate::constants::{ESCAPE_CHAR, FIELD_DELIMITER, columns, sinks};
use crate::error::{PadronError, Result};
use crate::models::{Record, RecordType, Schema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Escape one value for a sink line
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if !value
        .chars()
        .any(|c| matches!(c, '\\' | '|' | '"' | '\n' | '\r'))
    {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' | '|' | '"' => {
                escaped.push(ESCAPE_CHAR);
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Split a sink line into unescaped values
pub fn split_escaped_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE_CHAR => match chars.next() {
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => current.push(other),
                None => current.push(ESCAPE_CHAR),
            },
            FIELD_DELIMITER => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

/// Append-only writer for one classification file
#[derive(Debug)]
pub struct OutputSink {
    path: PathBuf,
    header: Vec<String>,
    writer: Option<BufWriter<File>>,
    rows_written: usize,
}

impl OutputSink {
    pub fn new(path: impl Into<PathBuf>, header: Vec<String>) -> Self {
        Self {
            path: path.into(),
            header,
            writer: None,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Open the destination on first use, writing the header if it is empty
    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            let is_empty = file.metadata()?.len() == 0;

            let mut writer = BufWriter::new(file);
            if is_empty {
                write_line(&mut writer, self.header.iter().map(String::as_str))?;
            }
            debug!("Opened sink {}", self.path.display());
            self.writer = Some(writer);
        }

        self.writer
            .as_mut()
            .ok_or_else(|| PadronError::configuration("sink writer unavailable"))
    }

    /// Append a batch of records, optionally tagged with an extra trailing value.
    ///
    /// Nothing is created for an empty batch. The batch is flushed before
    /// returning.
    pub fn append<'a, I>(&mut self, records: I, tag: Option<&str>) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut records = records.into_iter().peekable();
        if records.peek().is_none() {
            return Ok(0);
        }

        let writer = self.writer()?;
        let mut appended = 0;
        for record in records {
            let values = record.fields().iter().map(String::as_str).chain(tag);
            write_line(writer, values)?;
            appended += 1;
        }
        writer.flush()?;

        self.rows_written += appended;
        Ok(appended)
    }

    /// Flush and close the destination
    pub fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

fn write_line<'a, W, I>(writer: &mut W, values: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a str>,
{
    for (position, value) in values.into_iter().enumerate() {
        if position > 0 {
            write!(writer, "{}", FIELD_DELIMITER)?;
        }
        writer.write_all(escape_field(value).as_bytes())?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

/// Paths of the five classification files of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkPaths {
    pub partial_plan: PathBuf,
    pub multi_distinguished: PathBuf,
    pub multi_other: PathBuf,
    pub duplicates: PathBuf,
    pub errors: PathBuf,
}

impl SinkPaths {
    pub fn in_dir(work_dir: &Path) -> Self {
        Self {
            partial_plan: work_dir.join(sinks::PARTIAL_PLAN),
            multi_distinguished: work_dir.join(sinks::MULTI_AFFILIATION_DISTINGUISHED),
            multi_other: work_dir.join(sinks::MULTI_AFFILIATION_OTHER),
            duplicates: work_dir.join(sinks::DUPLICATES),
            errors: work_dir.join(sinks::ERRORS),
        }
    }

    /// Sinks a record type can produce, in delivery order
    pub fn for_type(&self, record_type: RecordType) -> Vec<&Path> {
        match record_type {
            RecordType::Emp => vec![
                self.partial_plan.as_path(),
                self.duplicates.as_path(),
                self.errors.as_path(),
            ],
            RecordType::Osn => vec![
                self.multi_distinguished.as_path(),
                self.multi_other.as_path(),
                self.duplicates.as_path(),
                self.errors.as_path(),
            ],
        }
    }
}

/// Open sinks of one analysis run
#[derive(Debug)]
pub struct SinkSet {
    pub partial_plan: OutputSink,
    pub multi_distinguished: OutputSink,
    pub multi_other: OutputSink,
    pub duplicates: OutputSink,
    pub errors: OutputSink,
}

impl SinkSet {
    pub fn new(paths: &SinkPaths, schema: &Schema) -> Self {
        let header = schema.columns().to_vec();
        let mut error_header = header.clone();
        error_header.push(columns::ERROR_FIELD.to_string());

        Self {
            partial_plan: OutputSink::new(&paths.partial_plan, header.clone()),
            multi_distinguished: OutputSink::new(&paths.multi_distinguished, header.clone()),
            multi_other: OutputSink::new(&paths.multi_other, header.clone()),
            duplicates: OutputSink::new(&paths.duplicates, header),
            errors: OutputSink::new(&paths.errors, error_header),
        }
    }

    pub fn finish(&mut self) -> Result<()> {
        self.partial_plan.finish()?;
        self.multi_distinguished.finish()?;
        self.multi_other.finish()?;
        self.duplicates.finish()?;
        self.errors.finish()
    }
}

/// Data rows of a sink file, 0 when it does not exist
pub fn count_rows(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0usize;
    for line in reader.lines() {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

/// Header and leading rows of a sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSample {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the header and first `limit` rows of a sink, empty when it does not exist
pub fn sample_rows(path: &Path, limit: usize) -> Result<SinkSample> {
    if !path.exists() {
        return Ok(SinkSample::default());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => split_escaped_line(&line?),
        None => return Ok(SinkSample::default()),
    };

    let mut rows = Vec::with_capacity(limit.min(1024));
    for line in lines.take(limit) {
        rows.push(split_escaped_line(&line?));
    }

    Ok(SinkSample { header, rows })
}
