//! Strip/restore against real git repositories
//!
//! Tests the production transaction: go.mod parsing, the git staging
//! query and the filesystem backup working together.

use super::common::git_fixtures::{TestRepo, GO_MOD, GO_MOD_REMOTE_ONLY};
use modstrip::{Config, ReplaceError, ReplaceTransaction, StripOutcome};
use std::fs;

fn transaction() -> ReplaceTransaction {
    ReplaceTransaction::from_config(&Config::default())
}

fn stripped_go_mod() -> String {
    GO_MOD.replace("replace example.com/lib => ../lib\n", "")
}

#[test]
fn test_strip_and_restore_round_trip() {
    let repo = TestRepo::with_go_mod(GO_MOD);
    let tx = transaction();

    let outcome = tx.strip(&repo.path, false).unwrap();

    match outcome {
        StripOutcome::Stripped { removed } => {
            assert_eq!(removed.len(), 1);
            assert_eq!(removed[0].old_path, "example.com/lib");
            assert_eq!(removed[0].new_path, "../lib");
        }
        other => panic!("expected Stripped, got {:?}", other),
    }
    assert_eq!(repo.read_file("go.mod"), stripped_go_mod());
    assert_eq!(repo.read_file("go.mod.b"), GO_MOD);
    assert!(tx.is_open(&repo.path).unwrap());

    tx.restore(&repo.path, false).unwrap();

    assert_eq!(repo.read_file("go.mod"), GO_MOD);
    assert!(!repo.path.join("go.mod.b").exists());
    assert!(!tx.is_open(&repo.path).unwrap());
}

#[test]
fn test_staged_only_skips_unstaged_manifest() {
    // Committed and unmodified, so nothing is staged
    let repo = TestRepo::with_go_mod(GO_MOD);
    let tx = transaction();

    let outcome = tx.strip(&repo.path, true).unwrap();

    assert_eq!(outcome, StripOutcome::NotStaged);
    assert_eq!(repo.read_file("go.mod"), GO_MOD);
    // The backup is still taken, so the post-commit restore finds it
    assert!(tx.is_open(&repo.path).unwrap());

    tx.restore(&repo.path, true).unwrap();
    assert_eq!(repo.read_file("go.mod"), GO_MOD);
}

#[test]
fn test_staged_only_strips_staged_manifest() {
    let repo = TestRepo::with_staged_go_mod(GO_MOD_REMOTE_ONLY, GO_MOD);
    let tx = transaction();

    let outcome = tx.strip(&repo.path, true).unwrap();

    assert!(outcome.changed_manifest());
    assert_eq!(repo.read_file("go.mod"), stripped_go_mod());

    tx.restore(&repo.path, true).unwrap();
    assert_eq!(repo.read_file("go.mod"), GO_MOD);
}

#[test]
fn test_staged_only_ignores_unstaged_edits() {
    let repo = TestRepo::with_go_mod(GO_MOD_REMOTE_ONLY);
    repo.create_file("go.mod", GO_MOD);
    let tx = transaction();

    assert_eq!(tx.strip(&repo.path, true).unwrap(), StripOutcome::NotStaged);
    assert_eq!(repo.read_file("go.mod"), GO_MOD);
}

#[test]
fn test_module_in_subdirectory() {
    let repo = TestRepo::new();
    repo.create_file("service/go.mod", GO_MOD);
    repo.stage_file("service/go.mod");
    let dir = repo.path.join("service");
    let tx = transaction();

    assert!(tx.strip(&dir, true).unwrap().changed_manifest());
    assert_eq!(repo.read_file("service/go.mod"), stripped_go_mod());

    tx.restore(&dir, true).unwrap();
    assert_eq!(repo.read_file("service/go.mod"), GO_MOD);
}

#[test]
fn test_second_strip_is_rejected() {
    let repo = TestRepo::with_go_mod(GO_MOD);
    let tx = transaction();
    tx.strip(&repo.path, false).unwrap();

    let err = tx.strip(&repo.path, false).unwrap_err();

    assert!(matches!(err, ReplaceError::BackupAlreadyExists(_)));
    // The first backup still holds the unstripped manifest
    assert_eq!(repo.read_file("go.mod.b"), GO_MOD);
}

#[test]
fn test_no_local_directives_leaves_manifest_alone() {
    let repo = TestRepo::with_go_mod(GO_MOD_REMOTE_ONLY);
    let tx = transaction();

    let outcome = tx.strip(&repo.path, false).unwrap();

    assert_eq!(outcome, StripOutcome::NoLocalDirectives);
    assert_eq!(repo.read_file("go.mod"), GO_MOD_REMOTE_ONLY);
    assert!(repo.path.join("go.mod.b").exists());
    tx.restore(&repo.path, false).unwrap();
}

#[test]
fn test_restore_without_backup() {
    let repo = TestRepo::with_go_mod(GO_MOD);

    let err = transaction().restore(&repo.path, false).unwrap_err();

    assert!(matches!(err, ReplaceError::BackupMissing(_)));
    assert_eq!(repo.read_file("go.mod"), GO_MOD);
}

#[test]
fn test_missing_directory_and_manifest() {
    let repo = TestRepo::new();
    let tx = transaction();

    let err = tx.strip(&repo.path.join("nope"), false).unwrap_err();
    assert!(matches!(err, ReplaceError::PathNotFound(_)));

    let err = tx.strip(&repo.path, false).unwrap_err();
    assert!(matches!(err, ReplaceError::ManifestNotFound(_)));
    assert!(!repo.path.join("go.mod.b").exists());
}

#[test]
fn test_parse_failure_keeps_backup() {
    let repo = TestRepo::with_go_mod("module example.com/app\n\nreplace a ../a\n");
    let tx = transaction();

    let err = tx.strip(&repo.path, false).unwrap_err();

    assert!(matches!(err, ReplaceError::Parse { .. }));
    assert!(repo.path.join("go.mod.b").exists());

    // Restoring closes the transaction again
    tx.restore(&repo.path, false).unwrap();
    assert!(!repo.path.join("go.mod.b").exists());
}

#[test]
fn test_configured_file_names() {
    let repo = TestRepo::with_go_mod(GO_MOD);
    let config = Config::from_toml_str("[replace]\nbackup = \".go.mod.orig\"\n").unwrap();
    let tx = ReplaceTransaction::from_config(&config);

    tx.strip(&repo.path, false).unwrap();

    assert_eq!(
        fs::read_to_string(repo.path.join(".go.mod.orig")).unwrap(),
        GO_MOD
    );
    assert!(!repo.path.join("go.mod.b").exists());
    tx.restore(&repo.path, false).unwrap();
}
