//! Reference catalogs driving schema and field validation
//!
//! A catalog tells, for one record type, which fields a record has and
//! which literal codes are accepted in each governed field. Catalog files
//! are semicolon-delimited tables with a field-name column (`campo`) and a
//! references column (`referencias`) holding `code=label` pairs.
//!
//! - [`loader`] - catalog file parsing and field-name normalization
//! - [`cache`] - read-through cache with expiry and an injectable source

pub mod cache;
pub mod loader;

pub use cache::{CatalogCache, CatalogSource, FileCatalogSource};
pub use loader::{normalize_field_name, parse_catalog};

use crate::models::{RecordType, Schema};
use std::collections::HashSet;

/// Accepted codes for one catalog-governed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    pub field: String,
    pub valid_values: HashSet<String>,
}

impl FieldReference {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            valid_values: HashSet::new(),
        }
    }

    /// Accept a code both as written and without leading zeros.
    ///
    /// An all-zero code such as `00` therefore also accepts the empty value.
    pub fn add_code(&mut self, code: &str) {
        let code = code.trim();
        if code.is_empty() {
            return;
        }
        self.valid_values.insert(code.to_string());
        self.valid_values
            .insert(code.trim_start_matches('0').to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.valid_values.is_empty()
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.valid_values.contains(value)
    }
}

/// Schema plus validation references for one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    schema: Schema,
    references: Vec<FieldReference>,
}

impl Catalog {
    pub fn new(schema: Schema, references: Vec<FieldReference>) -> Self {
        Self { schema, references }
    }

    /// Fixed EMP layout with no governed fields
    pub fn emp_without_references() -> Self {
        Self::new(Schema::emp(), Vec::new())
    }

    pub fn record_type(&self) -> RecordType {
        self.schema.record_type()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Governed fields in catalog order
    pub fn references(&self) -> &[FieldReference] {
        &self.references
    }

    pub fn reference(&self, field: &str) -> Option<&FieldReference> {
        self.references.iter().find(|r| r.field == field)
    }
}
