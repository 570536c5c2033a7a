//! Integration tests for the `pkgaudit` binary's argument handling and exit
//! codes, independent of any live registry.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn empty_package_name_exits_nonzero_with_error_json() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("pkgaudit")
        .unwrap()
        .arg("   ")
        .env("PKGAUDIT_CACHE_DIR", dir.path())
        .env("PKGAUDIT_REGISTRY_URL", "http://127.0.0.1:1")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"error\""));
}

#[test]
fn unreachable_registry_surfaces_as_error_not_panic() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("pkgaudit")
        .unwrap()
        .arg("some-package")
        .env("PKGAUDIT_CACHE_DIR", dir.path())
        .env("PKGAUDIT_REGISTRY_URL", "http://127.0.0.1:1")
        .env("PKGAUDIT_METADATA_TIMEOUT_SECS", "2")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"error\""));
}
