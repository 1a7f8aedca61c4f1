use assert_cmd::Command;
use predicates::prelude::predicate;
use serial_test::serial;

use crate::common::{FakeRepo, BOUNCER_UNDER_TEST};

#[test]
#[serial]
fn locate_prints_the_bouncer_path() -> Result<(), Box<dyn std::error::Error>> {
    let repo = FakeRepo::new()?;
    let mut cmd = Command::cargo_bin("bouncer-fixtures")?;
    cmd.current_dir(repo.path())
        .env_remove("BOUNCER_FIXTURES_CONFIG")
        .env("BOUNCER_UNDER_TEST", BOUNCER_UNDER_TEST)
        .arg("locate");
    cmd.assert()
        .success()
        .stdout(predicate::str::ends_with("bin/fake-bouncer\n"));
    Ok(())
}

#[test]
#[serial]
fn locate_fails_for_a_missing_bouncer() -> Result<(), Box<dyn std::error::Error>> {
    let repo = FakeRepo::new()?;
    let mut cmd = Command::cargo_bin("bouncer-fixtures")?;
    cmd.current_dir(repo.path())
        .env_remove("BOUNCER_FIXTURES_CONFIG")
        .env("BOUNCER_UNDER_TEST", "bin/not-built")
        .arg("locate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("BinaryNotFound"));
    Ok(())
}

#[test]
fn locate_needs_a_bouncer_under_test() -> Result<(), Box<dyn std::error::Error>> {
    let repo = FakeRepo::new()?;
    let mut cmd = Command::cargo_bin("bouncer-fixtures")?;
    cmd.current_dir(repo.path())
        .env_remove("BOUNCER_FIXTURES_CONFIG")
        .env_remove("BOUNCER_UNDER_TEST")
        .arg("locate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("MissingBouncerUnderTest"));
    Ok(())
}

#[test]
fn config_file_is_read() -> Result<(), Box<dyn std::error::Error>> {
    let repo = FakeRepo::new()?;
    let config = repo.path().join("fixtures.yaml");
    std::fs::write(&config, format!("bouncer_under_test: {BOUNCER_UNDER_TEST}\n"))?;

    let mut cmd = Command::cargo_bin("bouncer-fixtures")?;
    cmd.current_dir(repo.path())
        .env_remove("BOUNCER_UNDER_TEST")
        .arg("--config")
        .arg(&config)
        .arg("locate");
    cmd.assert().success().stdout(predicate::str::contains("fake-bouncer"));
    Ok(())
}
