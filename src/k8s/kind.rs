use std::fs;
use tempfile::TempDir;
use tracing::{info, warn};

use super::cli::{CliRunner, SystemCli};
use super::K8sError;
use crate::config::KindConfig;

const KIND: &str = "kind";

/// Two nodes: a control plane exposing the ingress node ports on the host, and a worker.
pub const KIND_CLUSTER_CONFIG: &str = r#"# two node (one worker) cluster config
kind: Cluster
apiVersion: kind.x-k8s.io/v1alpha4
nodes:
- role: control-plane
  kubeadmConfigPatches:
  - |
    kind: InitConfiguration
    nodeRegistration:
      kubeletExtraArgs:
        node-labels: "ingress-ready=true"
  extraPortMappings:
  - containerPort: 30000
    hostPort: 80
    protocol: TCP
  - containerPort: 30001
    hostPort: 443
    protocol: TCP
- role: worker
"#;

/// A local kind cluster.
///
/// Starting reuses a cluster with the same name if there is one. Stopping deletes it
/// only when it is not meant to be kept.
#[derive(Debug)]
pub struct KindCluster<R: CliRunner = SystemCli> {
    name: String,
    keep: bool,
    runner: R,
    config_dir: TempDir,
    running: bool,
}

impl KindCluster<SystemCli> {
    pub fn from_config(config: &KindConfig) -> Result<Self, K8sError> {
        Self::new(&config.cluster_name, config.keep_cluster, SystemCli)
    }
}

impl<R: CliRunner> KindCluster<R> {
    pub fn new(name: &str, keep: bool, runner: R) -> Result<Self, K8sError> {
        Ok(Self {
            name: name.to_string(),
            keep,
            runner,
            config_dir: tempfile::Builder::new().prefix("kind").tempdir()?,
            running: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(super) fn runner(&self) -> &R {
        &self.runner
    }

    /// Whether `kind` already knows a cluster with this name.
    pub fn exists(&self) -> Result<bool, K8sError> {
        let output = self.runner.run(KIND, &["get".to_string(), "clusters".to_string()])?;
        // "No kind clusters found." goes to stderr, stdout only lists names
        Ok(output.stdout.lines().any(|line| line.trim() == self.name))
    }

    pub fn start(&mut self) -> Result<(), K8sError> {
        if self.running {
            return Ok(());
        }
        if self.exists()? {
            info!(cluster = %self.name, "reusing existing kind cluster");
        } else {
            let config_path = self.config_dir.path().join("kind.yml");
            fs::write(&config_path, KIND_CLUSTER_CONFIG)?;
            info!(cluster = %self.name, "creating kind cluster");
            self.runner.run(
                KIND,
                &[
                    "create".to_string(),
                    "cluster".to_string(),
                    "--name".to_string(),
                    self.name.clone(),
                    "--config".to_string(),
                    config_path.to_string_lossy().into_owned(),
                ],
            )?;
        }
        self.running = true;
        Ok(())
    }

    /// Ends the session. The cluster is deleted unless it is kept.
    pub fn stop(&mut self) -> Result<(), K8sError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        if self.keep {
            info!(cluster = %self.name, "leaving kind cluster running");
            return Ok(());
        }
        self.delete()
    }

    /// Deletes the cluster regardless of `keep`.
    pub fn delete(&mut self) -> Result<(), K8sError> {
        self.running = false;
        info!(cluster = %self.name, "deleting kind cluster");
        self.runner.run(
            KIND,
            &[
                "delete".to_string(),
                "cluster".to_string(),
                "--name".to_string(),
                self.name.clone(),
            ],
        )?;
        Ok(())
    }
}

impl<R: CliRunner> Drop for KindCluster<R> {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(cluster = %self.name, %err, "could not stop kind cluster");
        }
    }
}
