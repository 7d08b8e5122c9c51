//! Per-run classification summary.
//!
//! Accumulates the totals produced by both analysis passes, one bucket per
//! reported population, and renders the plain-text reports shipped with the
//! delivered bundle.

use crate::constants::sinks;
use crate::error::Result;
use crate::models::RecordType;
use crate::parser::ParseStats;
use crate::processor::writer::SinkPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Counts for one reported population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    /// Rows parsed into this bucket
    pub total: usize,
    /// Partial-plan rows (EMP) or multi-affiliation rows (OSN)
    pub flagged: usize,
    /// Rows whose duplicate key occurs more than once
    pub duplicates: usize,
    /// Field validation failures, one per failing field
    pub errors: usize,
}

impl BucketTotals {
    pub fn flagged_pct(&self) -> f64 {
        percentage(self.flagged, self.total)
    }

    pub fn duplicates_pct(&self) -> f64 {
        percentage(self.duplicates, self.total)
    }

    pub fn errors_pct(&self) -> f64 {
        percentage(self.errors, self.total)
    }
}

/// Population a row is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Emp,
    Distinguished,
    Other,
}

/// Share of `count` in `total`, 0 for an empty total
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Percentage with one decimal, e.g. `12.5%`
pub fn format_percentage(count: usize, total: usize) -> String {
    format!("{:.1}%", percentage(count, total))
}

/// Thousands separated by dots, e.g. `1.234.567`
pub fn format_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}

/// Labelled view of one bucket for reporting
#[derive(Debug, Clone, Copy)]
pub struct BucketReport<'a> {
    pub title: &'static str,
    pub flagged_label: &'static str,
    pub file_name: &'static str,
    pub totals: &'a BucketTotals,
}

impl BucketReport<'_> {
    /// Plain-text report body as delivered in the bundle
    pub fn render(&self) -> String {
        [
            format!("Total: {}", self.totals.total),
            format!("{}: {}", self.flagged_label, self.totals.flagged),
            format!("Duplicados: {}", self.totals.duplicates),
            format!("Errores: {}", self.totals.errors),
        ]
        .join("\n")
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub record_type: RecordType,
    pub sources: Vec<PathBuf>,
    pub work_dir: PathBuf,
    pub sinks: SinkPaths,
    /// EMP rows
    pub emp: BucketTotals,
    /// OSN rows of the distinguished insurer
    pub distinguished: BucketTotals,
    /// OSN rows of every other insurer
    pub other: BucketTotals,
    /// Parser counters of the first pass, including dropped line groups
    pub parse: ParseStats,
}

impl Summary {
    pub fn new(record_type: RecordType, sources: Vec<PathBuf>, work_dir: PathBuf) -> Self {
        let sinks = SinkPaths::in_dir(&work_dir);
        Self {
            record_type,
            sources,
            work_dir,
            sinks,
            emp: BucketTotals::default(),
            distinguished: BucketTotals::default(),
            other: BucketTotals::default(),
            parse: ParseStats::default(),
        }
    }

    pub fn totals(&self, bucket: Bucket) -> &BucketTotals {
        match bucket {
            Bucket::Emp => &self.emp,
            Bucket::Distinguished => &self.distinguished,
            Bucket::Other => &self.other,
        }
    }

    pub fn totals_mut(&mut self, bucket: Bucket) -> &mut BucketTotals {
        match bucket {
            Bucket::Emp => &mut self.emp,
            Bucket::Distinguished => &mut self.distinguished,
            Bucket::Other => &mut self.other,
        }
    }

    /// Rows counted across every bucket of the record type
    pub fn total_rows(&self) -> usize {
        match self.record_type {
            RecordType::Emp => self.emp.total,
            RecordType::Osn => self.distinguished.total + self.other.total,
        }
    }

    /// Reported buckets of the record type, in report order
    pub fn buckets(&self) -> Vec<BucketReport<'_>> {
        match self.record_type {
            RecordType::Emp => vec![BucketReport {
                title: "Resumen EMP",
                flagged_label: "Plan Parcial",
                file_name: sinks::REPORT_EMP,
                totals: &self.emp,
            }],
            RecordType::Osn => vec![
                BucketReport {
                    title: "Resumen PAMI",
                    flagged_label: "Multi-CUIT",
                    file_name: sinks::REPORT_DISTINGUISHED,
                    totals: &self.distinguished,
                },
                BucketReport {
                    title: "Resumen resto OSN",
                    flagged_label: "Pluriempleo",
                    file_name: sinks::REPORT_OTHER,
                    totals: &self.other,
                },
            ],
        }
    }

    /// Sink files of this run that were actually written
    pub fn written_sinks(&self) -> Vec<&Path> {
        self.sinks
            .for_type(self.record_type)
            .into_iter()
            .filter(|path| path.exists())
            .collect()
    }

    /// Remove the working directory once the summary has been consumed
    pub fn cleanup(&self) -> Result<()> {
        if self.work_dir.exists() {
            std::fs::remove_dir_all(&self.work_dir)?;
            debug!("Removed working directory {}", self.work_dir.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_with_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(format_percentage(3, 0), "0.0%");

        let empty = BucketTotals::default();
        assert_eq!(empty.flagged_pct(), 0.0);
        assert_eq!(empty.duplicates_pct(), 0.0);
        assert_eq!(empty.errors_pct(), 0.0);
    }

    #[test]
    fn test_percentage_values() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(format_percentage(1, 3), "33.3%");
        assert_eq!(format_percentage(2, 2), "100.0%");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1.000");
        assert_eq!(format_thousands(1234567), "1.234.567");
    }

    #[test]
    fn test_buckets_per_record_type() {
        let mut summary = Summary::new(RecordType::Osn, vec![], PathBuf::from("/tmp/anal_x"));
        summary.distinguished.total = 3;
        summary.other.total = 4;

        let buckets = summary.buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].file_name, "Resumen_PAMI.txt");
        assert_eq!(buckets[1].flagged_label, "Pluriempleo");
        assert_eq!(summary.total_rows(), 7);

        let emp = Summary::new(RecordType::Emp, vec![], PathBuf::from("/tmp/anal_y"));
        assert_eq!(emp.buckets().len(), 1);
    }

    #[test]
    fn test_report_rendering() {
        let totals = BucketTotals {
            total: 10,
            flagged: 2,
            duplicates: 4,
            errors: 1,
        };
        let report = BucketReport {
            title: "Resumen EMP",
            flagged_label: "Plan Parcial",
            file_name: "Resumen_EMP.txt",
            totals: &totals,
        };
        assert_eq!(
            report.render(),
            "Total: 10\nPlan Parcial: 2\nDuplicados: 4\nErrores: 1"
        );
    }
}
