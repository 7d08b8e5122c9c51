//! Field validation against reference catalogs
//!
//! Catalog-governed fields are checked by set membership, except the
//! pattern-exempt fields which only need to be a 1-2 digit number.

use crate::catalog::Catalog;
use crate::constants::{PATTERN_EXEMPT_FIELDS, PATTERN_EXEMPT_RULE};
use crate::models::{Chunk, Record};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static SHORT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PATTERN_EXEMPT_RULE).expect("static pattern"));

/// How one governed field is checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Membership(HashSet<String>),
    ShortNumber,
}

impl FieldRule {
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            FieldRule::Membership(valid) => valid.contains(value),
            FieldRule::ShortNumber => SHORT_NUMBER.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GovernedField {
    pub name: String,
    pub index: usize,
    pub rule: FieldRule,
}

/// Records of one chunk failing one field
#[derive(Debug)]
pub struct FieldFailures<'a> {
    pub field: &'a str,
    pub records: Vec<&'a Record>,
}

/// Validation rules bound to schema positions
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    fields: Vec<GovernedField>,
}

impl FieldValidator {
    /// Governed fields of the catalog that exist in its schema, in catalog order
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let schema = catalog.schema();
        let fields = catalog
            .references()
            .iter()
            .filter(|reference| !reference.is_empty())
            .filter_map(|reference| {
                let index = schema.index_of(&reference.field)?;
                let rule = if PATTERN_EXEMPT_FIELDS.contains(&reference.field.as_str()) {
                    FieldRule::ShortNumber
                } else {
                    FieldRule::Membership(reference.valid_values.clone())
                };
                Some(GovernedField {
                    name: reference.field.clone(),
                    index,
                    rule,
                })
            })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[GovernedField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Failing records per field, field by field in catalog order.
    ///
    /// A record failing several fields shows up once per failing field.
    pub fn failures<'a>(&'a self, chunk: &'a Chunk) -> Vec<FieldFailures<'a>> {
        self.fields
            .iter()
            .filter_map(|field| {
                let records: Vec<&Record> = chunk
                    .iter()
                    .filter(|record| !field.rule.accepts(record.get(field.index).unwrap_or_default()))
                    .collect();
                (!records.is_empty()).then_some(FieldFailures {
                    field: &field.name,
                    records,
                })
            })
            .collect()
    }
}
