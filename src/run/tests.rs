#![allow(clippy::unwrap_used)]

use super::*;
use crate::export::Resource;
use std::io::Write;
use std::path::PathBuf;

const SAMPLE: &str = include_str!("../../testdata/sample.qif");

fn config_for(file: &tempfile::NamedTempFile) -> Config {
    Config {
        qif_path: Some(file.path().to_path_buf()),
        ..Config::default()
    }
}

fn sample_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    file
}

#[test]
fn test_export_writes_resource_from_loaded_ledger() {
    let qif = sample_file();
    let dir = tempfile::tempdir().unwrap();
    let output: PathBuf = dir.path().join("summary.csv");

    run(
        &config_for(&qif),
        Command::Export {
            resource: Resource::Summary,
            output: Some(output.clone()),
        },
    )
    .unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("Category,Transaction Count"));
    assert!(csv.contains("Salary"));
}

#[test]
fn test_stats_runs_against_loaded_ledger() {
    let qif = sample_file();
    run(&config_for(&qif), Command::Stats).unwrap();
}

#[test]
fn test_missing_qif_path_is_an_error() {
    let err = run(&Config::default(), Command::Stats).unwrap_err();
    assert!(err.to_string().contains("No QIF file given"));
}

#[test]
fn test_unreadable_qif_fails_before_serving() {
    let config = Config {
        qif_path: Some(PathBuf::from("/nonexistent/ledger.qif")),
        ..Config::default()
    };
    let err = run(&config, Command::Stats).unwrap_err();
    assert!(err.to_string().contains("Failed to load"));
}
