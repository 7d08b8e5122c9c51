//! Core data structures for registry processing.
//!
//! Defines record types, schemas, parsed records and the chunk unit used
//! for streaming and memory bounding.

use crate::constants::{DUPLICATE_KEY_WIDTH, EMP_COLUMNS};
use crate::error::PadronError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Registry families supported by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Prepaid-medicine entities: fixed layout, partial-plan detection
    Emp,
    /// National social-security insurers: catalog-driven layout,
    /// multi-affiliation detection
    Osn,
}

impl RecordType {
    pub fn code(&self) -> &'static str {
        match self {
            RecordType::Emp => "EMP",
            RecordType::Osn => "OSN",
        }
    }

    /// Whether the layout is fixed at compile time
    pub fn has_fixed_schema(&self) -> bool {
        matches!(self, RecordType::Emp)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RecordType {
    type Err = PadronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emp" => Ok(RecordType::Emp),
            "osn" => Ok(RecordType::Osn),
            _ => Err(PadronError::UnknownRecordType {
                value: s.to_string(),
            }),
        }
    }
}

/// Ordered field list of one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    record_type: RecordType,
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(record_type: RecordType, columns: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            // First occurrence wins when a layout repeats a name
            index.entry(name.clone()).or_insert(position);
        }
        Self {
            record_type,
            columns,
            index,
        }
    }

    /// The compile-time EMP layout
    pub fn emp() -> Self {
        Self::new(
            RecordType::Emp,
            EMP_COLUMNS.iter().map(|c| c.to_string()).collect(),
        )
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of fields every record of this schema carries
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Number of fields in the composite duplicate key
    pub fn key_width(&self) -> usize {
        DUPLICATE_KEY_WIDTH.min(self.columns.len())
    }
}

/// One logical registry line with exactly `Schema::width` fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<String>,
}

impl Record {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut String> {
        self.fields.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Composite duplicate key: the first `width` fields in schema order
    pub fn key_prefix(&self, width: usize) -> &[String] {
        &self.fields[..width.min(self.fields.len())]
    }
}

/// Bounded, ordered batch of records from one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    records: Vec<Record>,
}

impl Chunk {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Chunk {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
