use std::{
    collections::BTreeMap,
    fs,
    time::{Duration, Instant},
};

use assert_matches::assert_matches;
use bouncer_fixtures::{
    bouncer::BouncerError,
    matcher::LineMatchError,
    process::{ProcessHandle, ProcessError},
    waiter::WaitError,
    BouncerFixture,
};
use serial_test::serial;

use crate::common::{FakeRepo, CRASHING_BOUNCER_UNDER_TEST};

fn fixture(repo: &FakeRepo) -> BouncerFixture {
    BouncerFixture::from_config(&repo.harness_config(), &repo.path()).unwrap()
}

#[test]
#[serial]
fn config_is_written_and_output_captured() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);
    let config = BTreeMap::from([("mode", "iptables"), ("api_key", "secret")]);

    let bouncer = fixture.launch(&config).unwrap();

    bouncer
        .wait_for_lines_fnmatch(&[
            "config: *bouncer-config.yaml",
            "api_key: secret",
            "mode: iptables",
            "proxy started",
        ])
        .unwrap();
    // stderr shares the same file
    bouncer
        .wait_for_lines_fnmatch(&["warning: running without a lapi"])
        .unwrap();

    assert!(bouncer.config_path().ends_with("output0/bouncer-config.yaml"));
    assert_eq!(
        fs::read_to_string(bouncer.config_path()).unwrap(),
        "api_key: secret\nmode: iptables\n"
    );
    assert!(bouncer.output_path().ends_with("output0/output.txt"));
    bouncer.output().unwrap().no_fnmatch_line("local config found").unwrap();
}

#[test]
#[serial]
fn local_config_is_written_next_to_the_config() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);
    let config = BTreeMap::from([("mode", "iptables")]);
    let local = BTreeMap::from([("log_level", "trace")]);

    let first = fixture.launch(&config).unwrap();
    let second = fixture.launch_with_local(&config, &local).unwrap();

    second
        .wait_for_lines_fnmatch(&["mode: iptables", "local config found", "log_level: trace"])
        .unwrap();
    assert!(second.config_path().ends_with("output1/bouncer-config.yaml"));
    assert_ne!(first.output_path(), second.output_path());
}

#[test]
#[serial]
fn child_is_detected_and_halted() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);

    let mut bouncer = fixture.launch(&BTreeMap::from([("mode", "nftables")])).unwrap();

    let child = bouncer.wait_for_child_named("sleep").unwrap();
    assert_ne!(child.pid(), bouncer.pid());
    assert!(bouncer.wait_for_child().is_ok());

    assert_eq!(bouncer.halt_children().unwrap(), 1);
    bouncer.wait_for_lines_fnmatch(&["proxy stopped"]).unwrap();

    assert!(bouncer.stop().unwrap().success());
    assert_matches!(bouncer.wait_for_child(), Err(WaitError::Context(_)));
}

#[test]
#[serial]
fn crashed_bouncer_fails_child_waits_early() {
    let repo = FakeRepo::new().unwrap();
    let fixture = BouncerFixture::new(repo.path().join(CRASHING_BOUNCER_UNDER_TEST)).unwrap();
    let bouncer = fixture.launch(&BTreeMap::from([("mode", "iptables")])).unwrap();

    // output stays readable once the process is gone
    bouncer.wait_for_lines_fnmatch(&["fatal: no api key"]).unwrap();

    let started = Instant::now();
    let result = bouncer.wait_for_child_with_timeout(Duration::from_secs(10));

    assert_matches!(result, Err(WaitError::Context(err)) => {
        assert_eq!(err.to_string(), format!("process `{}` not found", bouncer.pid()));
    });
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn child_wait_times_out_with_no_children() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);
    let bouncer = fixture.launch(&BTreeMap::from([("mode", "iptables")])).unwrap();
    bouncer.wait_for_child_named("sleep").unwrap();

    // alive, with a child under another name
    let err = bouncer.wait_for_child_named("nginx").unwrap_err();
    assert!(err.is_timeout());
    assert_matches!(err.into_last_error(), Some(ProcessError::NoChildNamed(name)) => {
        assert_eq!(name, "nginx");
    });
}

#[test]
#[serial]
fn unmatched_lines_time_out_with_the_search_log() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);
    let bouncer = fixture.launch(&BTreeMap::from([("mode", "iptables")])).unwrap();
    bouncer.wait_for_lines_fnmatch(&["proxy started"]).unwrap();

    let timeout = Duration::from_millis(300);
    let err = bouncer
        .wait_for_lines_fnmatch_with_timeout(&["proxy started", "never printed"], timeout)
        .unwrap_err();

    assert_matches!(&err, WaitError::Timeout { last_error, elapsed, attempts } => {
        assert_matches!(last_error, BouncerError::Lines(LineMatchError::Unmatched { pattern, .. }) => {
            assert_eq!(pattern, "never printed");
        });
        assert!(*elapsed >= timeout);
        assert!(*attempts >= 2);
    });
    let message = err.to_string();
    assert!(message.contains("remains unmatched: `never printed`"));
    assert!(message.contains("nomatch: 'never printed'"));
}

#[test]
#[serial]
fn stop_kills_a_running_bouncer() {
    let repo = FakeRepo::new().unwrap();
    let fixture = fixture(&repo);
    let mut bouncer = fixture.launch(&BTreeMap::from([("mode", "iptables")])).unwrap();
    let child = bouncer.wait_for_child_named("sleep").unwrap();

    let status = bouncer.stop().unwrap();
    assert!(!status.success());
    // already reaped, same status again
    assert_eq!(bouncer.stop().unwrap(), status);
    assert!(!bouncer.process().is_running());

    // orphaned, no longer listed as a child
    assert!(bouncer.children().unwrap().is_empty());
    child.kill().unwrap();
}
