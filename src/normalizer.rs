//! Per-chunk field normalization.
//!
//! Runs right after parsing, before any classification or sink write.
//! Every value stays text; identifier columns are only cleaned of stray
//! whitespace and quote marks, and the province code is zero-padded.

use crate::constants::{PROVINCE_CODE_WIDTH, QUOTE_CHAR, columns};
use crate::models::{Chunk, Schema};

/// Column positions the normalizer touches for one schema
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    identifiers: Vec<usize>,
    province: Option<usize>,
}

impl FieldNormalizer {
    pub fn new(schema: &Schema) -> Self {
        let identifiers = columns::IDENTIFIERS
            .iter()
            .filter_map(|name| schema.index_of(name))
            .collect();

        Self {
            identifiers,
            province: schema.index_of(columns::PROVINCE),
        }
    }

    /// Normalize every record of a chunk and return it
    pub fn normalize(&self, mut chunk: Chunk) -> Chunk {
        for record in chunk.records_mut() {
            for &index in &self.identifiers {
                if let Some(value) = record.get_mut(index) {
                    let cleaned = clean_identifier(value);
                    if cleaned.len() != value.len() {
                        *value = cleaned.to_string();
                    }
                }
            }

            if let Some(value) = self.province.and_then(|index| record.get_mut(index)) {
                *value = zero_pad(value, PROVINCE_CODE_WIDTH).trim().to_string();
            }
        }
        chunk
    }
}

fn clean_identifier(value: &str) -> &str {
    value.trim().trim_matches(QUOTE_CHAR)
}

/// Left-pad with zeros to `width`, keeping a leading sign in front
pub fn zero_pad(value: &str, width: usize) -> String {
    let length = value.chars().count();
    if length >= width {
        return value.to_string();
    }

    let padding = "0".repeat(width - length);
    match value.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{padding}{}", &value[1..]),
        _ => format!("{padding}{value}"),
    }
}
