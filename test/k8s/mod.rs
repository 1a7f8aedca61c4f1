//! Needs `kind`, `helm` and a container runtime on the host.

use std::fs;

use assert_matches::assert_matches;
use bouncer_fixtures::{
    config::KindConfig,
    k8s::{Helm, K8sError, KindCluster, SystemCli},
    logging::Logging,
};
use serial_test::serial;
use tempfile::TempDir;

const CLUSTER_NAME: &str = "bouncer-fixtures-it";
const NGINX_CHART: &str = "oci://registry-1.docker.io/bitnamicharts/nginx";

fn cluster() -> KindCluster {
    Logging::init_for_tests();
    KindCluster::from_config(&KindConfig {
        cluster_name: CLUSTER_NAME.to_string(),
        keep_cluster: true,
    })
    .unwrap()
}

#[test]
#[serial]
#[ignore = "spawns a kind cluster"]
fn cluster_is_reused_across_sessions() {
    let mut first = cluster();
    first.start().unwrap();
    assert!(first.exists().unwrap());
    drop(first);

    // kept, so a new session finds it
    let mut second = cluster();
    assert!(second.exists().unwrap());
    second.start().unwrap();
    assert!(second.is_running());
}

#[test]
#[serial]
#[ignore = "spawns a kind cluster"]
fn release_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let mut cluster = cluster();
    cluster.start()?;

    let values_dir = TempDir::new()?;
    let values = values_dir.path().join("values.yaml");
    fs::write(&values, "replicaCount: 1\nservice:\n  type: ClusterIP\n")?;

    let helm = Helm::new(&cluster)?;
    let release = helm.install("fixtures", NGINX_CHART, Some(&values))?;
    assert_eq!(release.name(), "test-fixtures");

    // the name is taken while installed
    assert_matches!(helm.install("fixtures", NGINX_CHART, None), Err(K8sError::Cli(_)));

    release.uninstall()?;
    Ok(())
}

#[test]
#[serial]
#[ignore = "spawns a kind cluster"]
fn delete_removes_the_cluster() {
    let mut cluster = KindCluster::new(CLUSTER_NAME, true, SystemCli).unwrap();
    cluster.start().unwrap();

    cluster.delete().unwrap();

    assert!(!cluster.is_running());
    assert!(!cluster.exists().unwrap());
}
