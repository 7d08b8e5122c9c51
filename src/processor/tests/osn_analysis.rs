//! OSN analysis tests: catalog-driven layout, insurer buckets and
//! multi-affiliation

use super::{Workspace, osn_line, sink_rows};
use crate::models::RecordType;
use crate::summary::{format_percentage, percentage};

#[test]
fn test_multi_affiliation_rows_are_split_by_insurer_bucket() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[
            osn_line(["123", "500807", "30-1", "123", "1", "01", "0"]),
            osn_line(["123", "0125", "30-1", "123", "1", "01", "0"]),
            osn_line(["456", "0125", "30-1", "456", "2", "02", "0"]),
            osn_line(["789", "1001", "30-9", "789", "1", "01", "0"]),
            osn_line(["123", "500807", "30-2", "123", "1", "01", "0"]),
            osn_line(["456", "0125", "30-3", "456", "2", "02", "0"]),
        ],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    assert_eq!(summary.distinguished.total, 2);
    assert_eq!(summary.other.total, 4);
    assert_eq!(summary.total_rows(), 6);

    let distinguished = sink_rows(&summary.sinks.multi_distinguished);
    let employers: Vec<&str> = distinguished.iter().map(|row| row[2].as_str()).collect();
    assert_eq!(employers, vec!["30-1", "30-2"]);
    assert!(distinguished.iter().all(|row| row[0] == "123" && row[1] == "500807"));
    assert_eq!(summary.distinguished.flagged, 2);

    // "123" under 0125 has a single employer and is not flagged
    let other = sink_rows(&summary.sinks.multi_other);
    let pairs: Vec<(&str, &str)> = other
        .iter()
        .map(|row| (row[0].as_str(), row[2].as_str()))
        .collect();
    assert_eq!(pairs, vec![("456", "30-1"), ("456", "30-3")]);
    assert_eq!(summary.other.flagged, 2);

    assert!(!summary.sinks.partial_plan.exists());
}

#[test]
fn test_province_code_is_padded_before_validation_and_writing() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[
            osn_line(["111", "500807", "30-1", "111", "1", "5", "0"]),
            osn_line(["111", "500807", "30-2", "111", "1", " 5", "0"]),
        ],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    assert_eq!(summary.distinguished.errors, 0);
    let rows = sink_rows(&summary.sinks.multi_distinguished);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row[5] == "05"));
}

#[test]
fn test_invalid_codes_are_tagged_with_the_failing_field() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[
            osn_line(["111", "500807", "30-1", "111", "7", "01", "0"]),
            osn_line(["222", "125", "30-1", "222", "1", "01", "12"]),
            osn_line(["333", "0125", "30-1", "333", "2", "01", "123"]),
            osn_line(["444", "9999", "30-1", "444", "1", "01", "S"]),
        ],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    let errors = sink_rows(&summary.sinks.errors);
    let tagged: Vec<(&str, &str)> = errors
        .iter()
        .map(|row| (row[0].as_str(), row[7].as_str()))
        .collect();
    // Chunks of two rows, fields in catalog order within each chunk
    assert_eq!(
        tagged,
        vec![
            ("111", "sexo"),
            ("444", "codigo_os"),
            ("333", "discapacidad"),
            ("444", "discapacidad"),
        ]
    );

    let header = crate::processor::writer::sample_rows(&summary.sinks.errors, 0)
        .unwrap()
        .header;
    assert_eq!(header.last().map(String::as_str), Some("campo_error"));

    assert_eq!(summary.distinguished.errors, 1);
    assert_eq!(summary.other.errors, 3);
}

#[test]
fn test_duplicates_go_to_one_sink_with_counts_per_bucket() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[
            osn_line(["111", "500807", "30-1", "111", "1", "01", "0"]),
            osn_line(["222", "1001", "30-1", "222", "1", "01", "0"]),
            osn_line(["111", "500807", "30-1", "111", "1", "02", "1"]),
            osn_line(["222", "1001", "30-1", "222", "1", "12", "0"]),
            osn_line(["333", "1001", "30-1", "333", "1", "01", "0"]),
        ],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    assert_eq!(summary.distinguished.duplicates, 2);
    assert_eq!(summary.other.duplicates, 2);

    let duplicates = sink_rows(&summary.sinks.duplicates);
    let ids: Vec<&str> = duplicates.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(ids, vec!["111", "222", "111", "222"]);
}

#[test]
fn test_empty_bucket_reports_zero_percentages() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[osn_line(["111", "1001", "30-1", "111", "1", "01", "0"])],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    let empty = summary.distinguished;
    assert_eq!(empty.total, 0);
    assert_eq!(empty.flagged_pct(), 0.0);
    assert_eq!(empty.duplicates_pct(), 0.0);
    assert_eq!(empty.errors_pct(), 0.0);
    assert_eq!(format_percentage(empty.errors, empty.total), "0.0%");
    assert_eq!(percentage(summary.other.total, summary.total_rows()), 100.0);
    assert!(summary.written_sinks().is_empty());
}

#[test]
fn test_sources_are_processed_in_the_given_order() {
    let workspace = Workspace::new().with_osn_catalog();
    let second = workspace.source(
        "b.txt",
        &[osn_line(["555", "0125", "30-2", "555", "1", "01", "0"])],
    );
    let first = workspace.source(
        "a.txt",
        &[osn_line(["555", "0125", "30-1", "555", "1", "01", "0"])],
    );

    let summary = workspace
        .processor()
        .analyze(&[second, first], RecordType::Osn)
        .unwrap()
        .unwrap();

    let rows = sink_rows(&summary.sinks.multi_other);
    let employers: Vec<&str> = rows.iter().map(|row| row[2].as_str()).collect();
    assert_eq!(employers, vec!["30-2", "30-1"]);
}

#[test]
fn test_dropped_line_groups_are_counted_but_never_classified() {
    let workspace = Workspace::new().with_osn_catalog();
    let source = workspace.source(
        "osn.txt",
        &[
            osn_line(["111", "500807", "30-1", "111", "1", "01", "0"]),
            "111|500807|30-1|111|1|01|0|extra".to_string(),
            osn_line(["111", "500807", "30-1", "111", "1", "01", "0"]),
        ],
    );

    let summary = workspace
        .processor()
        .analyze(&[source], RecordType::Osn)
        .unwrap()
        .unwrap();

    assert_eq!(summary.parse.groups_dropped, 1);
    assert_eq!(summary.distinguished.total, 2);
    assert_eq!(sink_rows(&summary.sinks.duplicates).len(), 2);
}
