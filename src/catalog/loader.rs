//! Catalog file parsing
//!
//! Apostrophes are removed wholesale before the table is read; a quote
//! directly before a line break also joins the two lines.

use super::{Catalog, FieldReference};
use crate::constants::{CATALOG_DELIMITER, catalog};
use crate::error::{PadronError, Result};
use crate::models::{RecordType, Schema};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9A-Za-z]+").expect("static pattern")
});

/// Normalize a field or header name: strip diacritics, lower-case and
/// collapse every other non-alphanumeric run into one underscore
pub fn normalize_field_name(name: &str) -> String {
    let folded: String = name.chars().filter_map(fold_to_ascii).collect();
    NON_ALPHANUMERIC
        .replace_all(&folded, "_")
        .trim_matches('_')
        .to_lowercase()
}

/// ASCII base of a Latin character, `None` when it has none
fn fold_to_ascii(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let base = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ª' => 'a',
        'Ç' => 'C',
        'ç' => 'c',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'º' => 'o',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ý' => 'Y',
        'ý' | 'ÿ' => 'y',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        // Non-breaking space decomposes to a plain space
        '\u{a0}' => ' ',
        _ => return None,
    };
    Some(base)
}

/// Parse catalog text into a [`Catalog`] for `record_type`.
///
/// For the fixed-layout type the schema stays the compile-time one and the
/// catalog only contributes references.
pub fn parse_catalog(record_type: RecordType, text: &str, path: &Path) -> Result<Catalog> {
    let cleaned = text
        .replace("'\r\n", "")
        .replace("'\n", "")
        .replace('\'', "");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CATALOG_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(cleaned.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(normalize_field_name)
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PadronError::CatalogFormat {
                path: path.to_path_buf(),
                reason: format!("missing '{}' column", name),
            })
    };
    let field_column = column(catalog::FIELD_COLUMN)?;
    let references_column = column(catalog::REFERENCES_COLUMN)?;

    let mut fields: Vec<String> = Vec::new();
    let mut references: Vec<FieldReference> = Vec::new();

    for row in reader.records() {
        let row = row?;
        let field = normalize_field_name(row.get(field_column).unwrap_or_default());
        if field.is_empty() {
            continue;
        }
        fields.push(field.clone());

        let listed = row.get(references_column).unwrap_or_default().trim();
        if listed.is_empty() {
            continue;
        }

        let mut codes = FieldReference::new(field.clone());
        for entry in listed.split(catalog::ENTRY_SEPARATOR) {
            let code = entry.split(catalog::CODE_SEPARATOR).next().unwrap_or_default();
            codes.add_code(code);
        }
        // A field is governed only once it lists at least one code
        if codes.is_empty() {
            continue;
        }

        match references.iter_mut().find(|r| r.field == field) {
            Some(existing) => existing.valid_values.extend(codes.valid_values),
            None => references.push(codes),
        }
    }

    if !record_type.has_fixed_schema() && fields.is_empty() {
        return Err(PadronError::CatalogFormat {
            path: path.to_path_buf(),
            reason: "catalog defines no fields".to_string(),
        });
    }

    debug!(
        "Parsed {} catalog {}: {} fields, {} governed",
        record_type,
        path.display(),
        fields.len(),
        references.len()
    );

    let schema = if record_type.has_fixed_schema() {
        Schema::emp()
    } else {
        Schema::new(record_type, fields)
    };

    Ok(Catalog::new(schema, references))
}
