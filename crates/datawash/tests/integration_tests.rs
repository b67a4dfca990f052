//! Integration tests for the cleaning session.
//!
//! These tests drive a [`Session`] end to end against the CSV fixtures.

use datawash::utils::numeric_values;
use datawash::{
    ActionKind, ColumnKind, CsvOptions, ImputationStrategy, OutlierTreatment, Session,
    SessionConfig, StagePhase, WashError,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn session_with(filename: &str) -> Session {
    let mut session = Session::new(SessionConfig::default());
    session
        .upload_path(fixtures_path().join(filename))
        .expect("Failed to load fixture");
    session
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("datawash-it-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn column_f64(session: &Session, column: &str) -> Vec<Option<f64>> {
    numeric_values(session.table().unwrap().series(column).unwrap()).unwrap()
}

// ============================================================================
// Staged imputation
// ============================================================================

#[test]
fn test_mean_imputation_end_to_end() {
    let mut session = session_with("people.csv");

    let report = session.remaining_missing().unwrap();
    assert_eq!(report.get("age").unwrap().missing_count, 2);
    assert_eq!(report.get("age").unwrap().missing_percentage, 40.0);

    let selection = session
        .selection()
        .unwrap()
        .choose("age", ImputationStrategy::Mean)
        .unwrap()
        .build()
        .unwrap();

    let outcome = session.process(&selection).unwrap();
    let candidate_age = numeric_values(outcome.candidate.series("age").unwrap()).unwrap();
    assert_eq!(
        candidate_age,
        vec![Some(20.0), Some(40.0), Some(40.0), Some(40.0), Some(60.0)]
    );

    session.save().unwrap();

    assert_eq!(session.table().unwrap().series("age").unwrap().null_count(), 0);
    assert!(session.processed_columns().contains("age"));
    assert!(session.remaining_missing().unwrap().get("age").is_none());
}

#[test]
fn test_second_save_leaves_table_unchanged() {
    let mut session = session_with("people.csv");
    let selection = session
        .select(&[("income".to_string(), ImputationStrategy::Median)])
        .unwrap();
    session.process(&selection).unwrap();
    session.save().unwrap();

    let after_first = session.table().unwrap().frame().clone();
    let history_len = session.history().count();

    let err = session.save().unwrap_err();
    assert!(matches!(err, WashError::NothingToSave));
    assert!(err.is_recoverable());
    assert!(session.table().unwrap().frame().equals_missing(&after_first));
    assert_eq!(session.history().count(), history_len);
}

#[test]
fn test_mixed_strategies_and_warnings() {
    let mut session = session_with("people.csv");
    assert_eq!(session.table().unwrap().kind("member").unwrap(), ColumnKind::Boolean);

    let selection = session
        .select(&[
            ("age".to_string(), ImputationStrategy::Knn),
            ("city".to_string(), ImputationStrategy::Unknown),
            ("member".to_string(), ImputationStrategy::Mode),
        ])
        .unwrap();
    let outcome = session.process(&selection).unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].column(), "age");

    let report = session.save().unwrap();
    assert_eq!(report.newly_processed, vec!["city", "member"]);

    let table = session.table().unwrap();
    let cities: Vec<Option<&str>> = table
        .series("city")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(cities[3], Some("Unknown"));
    assert_eq!(table.kind("member").unwrap(), ColumnKind::Boolean);
    // true and false tie at two each; true is seen first
    let members: Vec<Option<bool>> = table
        .series("member")
        .unwrap()
        .bool()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(members[3], Some(true));

    // KNN left the column untouched and available for another attempt
    assert_eq!(table.series("age").unwrap().null_count(), 2);
    assert!(report.remaining.get("age").is_some());
}

#[test]
fn test_selection_from_before_a_direct_mutation_is_stale() {
    let mut session = session_with("people.csv");
    let selection = session
        .select(&[("age".to_string(), ImputationStrategy::Mean)])
        .unwrap();

    session.remove_duplicates().unwrap();

    let err = session.process(&selection).unwrap_err();
    assert!(matches!(err, WashError::StaleSelection { .. }));
    assert_eq!(session.phase(), StagePhase::Idle);
}

// ============================================================================
// Upload
// ============================================================================

#[test]
fn test_unparseable_upload_keeps_existing_data() {
    let mut session = session_with("people.csv");
    let before = session.status();

    let err = session
        .upload_path(fixtures_path().join("blank.csv"))
        .unwrap_err();
    assert_eq!(err.error_code(), "INGESTION_FAILED");
    assert_eq!(session.status(), before);

    let err = session
        .upload_path(fixtures_path().join("does_not_exist.csv"))
        .unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");
    assert!(session.table().is_ok());
}

#[test]
fn test_lowercase_nan_column_can_be_mean_imputed() {
    let mut session = Session::new(SessionConfig::default());
    session
        .upload_bytes(b"x\n1\nnan\n3\nNULL\n".to_vec(), "upload.csv")
        .unwrap();

    let report = session.remaining_missing().unwrap();
    assert_eq!(report.get("x").unwrap().kind, ColumnKind::Numeric);
    assert_eq!(report.get("x").unwrap().missing_count, 2);

    let selection = session
        .select(&[("x".to_string(), ImputationStrategy::Mean)])
        .unwrap();
    session.process(&selection).unwrap();
    session.save().unwrap();
    assert_eq!(
        column_f64(&session, "x"),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(2.0)]
    );
}

#[test]
fn test_config_file_controls_parsing() {
    let dir = scratch_dir("config");
    let config_path = dir.join("config.json");
    std::fs::write(
        &config_path,
        r#"{ "csv": { "separator": ";", "null_markers": ["?"] }, "preview_rows": 2 }"#,
    )
    .unwrap();
    let data_path = dir.join("data.csv");
    std::fs::write(&data_path, "a;b\n1;x\n?;y\n3;?\n").unwrap();

    let config = SessionConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.csv.separator, ';');
    assert_eq!(config.csv.has_header, CsvOptions::default().has_header);

    let mut session = Session::new(config);
    let summary = session.upload_path(&data_path).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(session.missing_report().unwrap().total_missing(), 2);
    assert_eq!(session.head(None).unwrap().height(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Direct cleaning
// ============================================================================

#[test]
fn test_duplicate_removal_is_idempotent() {
    let mut session = session_with("duplicates.csv");

    assert_eq!(session.remove_duplicates().unwrap(), 3);
    let ids: Vec<Option<i64>> = session
        .table()
        .unwrap()
        .series("id")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);

    assert_eq!(session.remove_duplicates().unwrap(), 0);
    assert_eq!(session.table().unwrap().height(), 3);
}

#[test]
fn test_outlier_cap_uses_fence_from_original_data() {
    let mut session = session_with("outliers.csv");

    let report = session.detect_outliers("reading").unwrap();
    assert_eq!(report.positions, vec![8]);
    assert_eq!(report.fence.upper, 7.0);

    session
        .treat_outliers("reading", OutlierTreatment::Cap)
        .unwrap();
    assert_eq!(column_f64(&session, "reading")[8], Some(7.0));

    let err = session.detect_outliers("sensor").unwrap_err();
    assert_eq!(err.error_code(), "NOT_NUMERIC");
}

#[test]
fn test_outlier_removal_drops_rows() {
    let mut session = session_with("outliers.csv");
    let summary = session
        .treat_outliers("reading", OutlierTreatment::Remove)
        .unwrap();

    assert_eq!(summary.rows_removed, 1);
    assert_eq!(session.table().unwrap().height(), 8);
}

#[test]
fn test_encode_then_drop_low_variance() {
    let mut session = session_with("features.csv");

    let summary = session.one_hot_encode(None).unwrap();
    assert_eq!(summary.indicator_count(), 4);
    assert_eq!(
        session.table().unwrap().column_names(),
        vec![
            "flag_const",
            "weight",
            "color_green",
            "color_red",
            "size_M",
            "size_S"
        ]
    );

    let removed = session.drop_low_variance(None).unwrap();
    assert_eq!(removed, vec!["flag_const"]);

    let actions: Vec<ActionKind> = session.history().map(|h| h.action).collect();
    assert_eq!(
        actions,
        vec![
            ActionKind::Upload,
            ActionKind::OneHotEncoding,
            ActionKind::VarianceThreshold
        ]
    );
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_export_round_trip() {
    let mut session = session_with("people.csv");
    let selection = session
        .select(&[
            ("age".to_string(), ImputationStrategy::Median),
            ("city".to_string(), ImputationStrategy::Mode),
        ])
        .unwrap();
    session.process(&selection).unwrap();
    session.save().unwrap();

    let dir = scratch_dir("export");
    let path = session.export_to(dir.join("out/cleaned.csv")).unwrap();

    let mut reloaded = Session::new(SessionConfig::default());
    let summary = reloaded.upload_path(&path).unwrap();

    assert_eq!(summary.rows, 5);
    assert_eq!(
        reloaded.table().unwrap().column_names(),
        session.table().unwrap().column_names()
    );
    assert_eq!(column_f64(&reloaded, "age"), column_f64(&session, "age"));
    let missing = reloaded.missing_report().unwrap();
    assert!(missing.get("age").is_none());
    assert!(missing.get("city").is_none());
    assert!(missing.get("income").is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_export_bytes_has_header() {
    let session = session_with("duplicates.csv");
    let bytes = session.export_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("id,name,score\n"));
    assert_eq!(text.lines().count(), 7);
}

#[test]
fn test_frame_is_readable_by_polars() {
    let session = session_with("people.csv");
    let head: DataFrame = session.head(Some(3)).unwrap();
    assert_eq!(head.height(), 3);
    assert_eq!(head.width(), 5);
}
