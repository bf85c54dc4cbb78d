//! End-to-end tests for `samadhi search`
//!
//! These tests run the real binary against a SQLite catalog seeded in a
//! temporary directory:
//! - Short and long output
//! - Wildcard and path filters
//! - Usage errors raised before the catalog is opened
//! - Credentials file problems

use assert_cmd::Command;
use predicates::prelude::*;
use samadhi_store::{
    Credentials, NewAnalysis, NewDataset, NewFile, NewPhysicsResult, NewSample, Session,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to write a test-mode credentials file with the given mode
fn write_credentials(dir: &TempDir, mode: u32) -> PathBuf {
    let path = dir.path().join("samadhi.json");
    fs::write(&path, r#"{"test": true, "database": "catalog.db"}"#)
        .expect("Failed to write credentials");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .expect("Failed to set permissions");
    }
    #[cfg(not(unix))]
    let _ = mode;
    path
}

/// Helper to create a catalog with a few records of every type
fn seed_catalog(dir: &TempDir) -> PathBuf {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to start runtime");
    runtime.block_on(async {
        let credentials = Credentials::Test {
            database: dir.path().join("catalog.db"),
        };
        let session = Session::connect(&credentials).await.expect("connect");
        session.create_tables().await.expect("create tables");

        let dataset = NewDataset {
            xsection: Some(0.5),
            ..NewDataset::new("ttbar_powheg", "mc")
        }
        .create(&session)
        .await
        .expect("dataset");
        NewDataset::new("run1", "data").create(&session).await.expect("dataset");
        NewDataset::new("run12", "data").create(&session).await.expect("dataset");

        let sample = NewSample {
            source_dataset_id: Some(dataset.id),
            author: Some("llbb".to_string()),
            ..NewSample::new("ttbar_semilep", "/store/user/llbb/ttbar_semilep", "NTUPLES", 1000)
        }
        .create(&session)
        .await
        .expect("sample");
        NewSample::new("dy_m50", "/store/user/llbb/dy_m50", "NTUPLES", 10)
            .create(&session)
            .await
            .expect("sample");
        for i in 0..2 {
            NewFile::new(
                format!("/store/user/llbb/ttbar_semilep/out_{i}.root"),
                format!("root://eos/out_{i}.root"),
                500,
                500.0,
                sample.id,
            )
            .create(&session)
            .await
            .expect("file");
        }

        let analysis = NewAnalysis::described("Top pair cross section")
            .create(&session)
            .await
            .expect("analysis");
        let result = NewPhysicsResult {
            description: Some("Control plots".to_string()),
            analysis_id: Some(analysis.id),
            ..NewPhysicsResult::at("/results/ttbar/plots")
        }
        .create(&session)
        .await
        .expect("result");
        sample.attach_result(&session, &result).await.expect("link");

        session.close().await;
    });
    write_credentials(dir, 0o400)
}

fn samadhi(credentials: &Path) -> Command {
    let mut cmd = Command::cargo_bin("samadhi").expect("binary");
    cmd.env_remove("SAMADHI_CREDENTIALS")
        .arg("--credentials")
        .arg(credentials);
    cmd
}

#[test]
fn test_search_help() {
    let mut cmd = Command::cargo_bin("samadhi").unwrap();
    cmd.arg("search")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--path"))
        .stdout(predicate::str::contains("--long"));
}

#[test]
fn test_search_dataset_by_name_wildcard() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "dataset", "-n", "run?"])
        .assert()
        .success()
        .stdout("2\trun1\n");
}

#[test]
fn test_search_sample_by_id_long() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "sample", "--long", "-i", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Sample #1 (created on "))
        .stdout(predicate::str::contains("  (effective) luminosity: 2000.0\n"))
        .stdout(predicate::str::contains("  source dataset: 1\n"))
        .stdout(predicate::str::contains("  2 files: \n    - /store/user/llbb/ttbar_semilep/out_0.root (500 entries)"))
        .stdout(predicate::str::ends_with(format!("{}\n", "-".repeat(86))));
}

#[test]
fn test_search_sample_by_path() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "sample", "-p", "/store/user/llbb/./dy_*"])
        .assert()
        .success()
        .stdout("2\tdy_m50\n");
}

#[test]
fn test_search_result_prints_description() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "result", "-p", "/results/*"])
        .assert()
        .success()
        .stdout("1\tControl plots\n");

    samadhi(&credentials)
        .args(["search", "result", "-l", "-i", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  part of analysis Top pair cross section"));
}

#[test]
fn test_search_analysis_long() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "analysis", "-l", "-n", "Top*"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Top pair cross section\n  Number of associated results: 1\n",
        ));
}

#[test]
fn test_no_match_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let credentials = seed_catalog(&dir);

    samadhi(&credentials)
        .args(["search", "dataset", "-i", "99"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_dataset_by_path_is_rejected_before_opening_catalog() {
    let dir = TempDir::new().unwrap();
    // The credentials file does not exist; the usage error must come first.
    samadhi(&dir.path().join("missing.json"))
        .args(["search", "dataset", "-p", "/some/path"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot search dataset by path"));
}

#[test]
fn test_result_by_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    samadhi(&dir.path().join("missing.json"))
        .args(["search", "result", "-n", "plots"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot search results by name"));
}

#[test]
fn test_filter_is_required() {
    let dir = TempDir::new().unwrap();
    samadhi(&dir.path().join("missing.json"))
        .args(["search", "sample"])
        .assert()
        .code(2);
}

#[test]
fn test_missing_credentials_file() {
    let dir = TempDir::new().unwrap();
    samadhi(&dir.path().join("missing.json"))
        .args(["search", "sample", "-i", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
#[test]
fn test_group_readable_credentials_are_rejected() {
    let dir = TempDir::new().unwrap();
    let credentials = write_credentials(&dir, 0o440);

    samadhi(&credentials)
        .args(["search", "sample", "-i", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("chmod 400"));
}

#[test]
fn test_empty_path_is_usage_error() {
    let dir = TempDir::new().unwrap();
    samadhi(&dir.path().join("missing.json"))
        .args(["search", "sample", "-p", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid path"));
}
