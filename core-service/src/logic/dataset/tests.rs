use super::synthetic::{generate, rule_label, to_csv};
use super::{from_reader, load_csv, summarize, unzip};
use crate::error::CoreError;
use tempfile::tempdir;
use std::fs;

const SAMPLE: &str = "\
Age,Sex,BP,Cholesterol,Na_to_K,Drug
23,F,HIGH,HIGH,25.355,DrugY
47,M,LOW,HIGH,13.093,drugC
47,M,LOW,HIGH,10.114,drugC
28,F,NORMAL,HIGH,7.798,drugX
61,F,LOW,HIGH,18.043,DrugY
";

#[test]
fn test_parse_drug200_layout() {
    let rows = from_reader(SAMPLE.as_bytes()).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].record.age(), 23);
    assert_eq!(rows[0].label, "DrugY");
    assert_eq!(rows[1].record.na_to_k(), 13.093);
    assert_eq!(rows[4].label, "DrugY");
}

#[test]
fn test_columns_located_by_header() {
    let shuffled = "Drug,Na_to_K,Cholesterol,BP,Sex,Age\ndrugX, 7.5 ,NORMAL,LOW,M,33\n";
    let rows = from_reader(shuffled.as_bytes()).unwrap();
    assert_eq!(rows[0].record.age(), 33);
    assert_eq!(rows[0].record.na_to_k(), 7.5);
    assert_eq!(rows[0].label, "drugX");
}

#[test]
fn test_missing_column_is_schema_error() {
    let no_bp = "Age,Sex,Cholesterol,Na_to_K,Drug\n23,F,HIGH,25.3,DrugY\n";
    let err = from_reader(no_bp.as_bytes()).unwrap_err();
    assert!(matches!(err, CoreError::Schema(_)));
    assert!(err.to_string().contains("BP"));
}

#[test]
fn test_bad_row_reports_line() {
    let bad = "Age,Sex,BP,Cholesterol,Na_to_K,Drug\n23,F,HIGH,HIGH,25.3,DrugY\n-4,M,LOW,HIGH,10.0,drugC\n";
    let err = from_reader(bad.as_bytes()).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(err.to_string().contains("line 3"), "{}", err);

    let garbled = "Age,Sex,BP,Cholesterol,Na_to_K,Drug\nold,F,HIGH,HIGH,25.3,DrugY\n";
    let err = from_reader(garbled.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("Age"), "{}", err);
}

#[test]
fn test_empty_label_rejected() {
    let blank = "Age,Sex,BP,Cholesterol,Na_to_K,Drug\n23,F,HIGH,HIGH,25.3,\n";
    assert!(matches!(from_reader(blank.as_bytes()), Err(CoreError::Validation(_))));
}

#[test]
fn test_load_csv_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drug200.csv");
    fs::write(&path, SAMPLE).unwrap();

    let rows = load_csv(&path).unwrap();
    assert_eq!(rows.len(), 5);

    let missing = load_csv(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(missing, CoreError::Persistence(_)));
}

#[test]
fn test_synthetic_csv_round_trip() {
    let rows = generate(40, 9);
    let parsed = from_reader(to_csv(&rows).as_bytes()).unwrap();
    assert_eq!(parsed, rows);
    for row in &parsed {
        assert_eq!(row.label, rule_label(&row.record));
    }
}

#[test]
fn test_summary() {
    let rows = from_reader(SAMPLE.as_bytes()).unwrap();
    let summary = summarize(&rows);

    assert_eq!(summary.rows, 5);
    assert_eq!(summary.label_counts["DrugY"], 2);
    assert_eq!(summary.label_counts["drugC"], 2);
    assert_eq!(summary.sex_counts["F"], 3);
    assert_eq!(summary.bp_counts["LOW"], 3);
    assert_eq!(summary.cholesterol_counts["HIGH"], 5);

    let age = summary.age.unwrap();
    assert_eq!(age.min, 23.0);
    assert_eq!(age.max, 61.0);
    assert!((age.mean - 41.2).abs() < 1e-9);

    let text = summary.to_string();
    assert!(text.contains("Rows: 5"));
    assert!(text.contains("DrugY"));
}

#[test]
fn test_summary_of_empty_dataset() {
    let summary = summarize(&[]);
    assert_eq!(summary.rows, 0);
    assert!(summary.age.is_none());
    assert!(summary.label_counts.is_empty());
}

#[test]
fn test_unzip_keeps_order() {
    let rows = from_reader(SAMPLE.as_bytes()).unwrap();
    let (records, labels) = unzip(&rows);
    assert_eq!(records.len(), labels.len());
    assert_eq!(labels[3], "drugX");
    assert_eq!(records[3].age(), 28);
}
