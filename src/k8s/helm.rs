use std::path::Path;
use tracing::{info, warn};

use super::cli::{CliRunner, SystemCli};
use super::kind::KindCluster;
use super::K8sError;

const HELM: &str = "helm";

/// Installs releases into a running [KindCluster]. Releases borrow the cluster, so it
/// cannot be stopped while any of them is installed.
#[derive(Debug)]
pub struct Helm<'k, R: CliRunner = SystemCli> {
    runner: &'k R,
}

impl<'k, R: CliRunner> Helm<'k, R> {
    pub fn new(cluster: &'k KindCluster<R>) -> Result<Self, K8sError> {
        if !cluster.is_running() {
            return Err(K8sError::ClusterNotRunning(cluster.name().to_string()));
        }
        Ok(Self {
            runner: cluster.runner(),
        })
    }

    /// Installs `chart` as release `test-<namespace>`, creating the namespace if needed.
    pub fn install(
        &self,
        namespace: &str,
        chart: &str,
        values: Option<&Path>,
    ) -> Result<HelmRelease<'k, R>, K8sError> {
        let release = release_name(namespace);
        let mut args = vec![
            "install".to_string(),
            "--create-namespace".to_string(),
            release.clone(),
            chart.to_string(),
            "--namespace".to_string(),
            namespace.to_string(),
        ];
        if let Some(values) = values {
            args.push("-f".to_string());
            args.push(values.to_string_lossy().into_owned());
        }

        self.runner.run(HELM, &args)?;
        info!(%release, namespace, chart, "helm release installed");

        Ok(HelmRelease {
            runner: self.runner,
            name: release,
            namespace: namespace.to_string(),
            installed: true,
        })
    }
}

pub fn release_name(namespace: &str) -> String {
    format!("test-{namespace}")
}

/// An installed release. It is uninstalled when dropped.
#[derive(Debug)]
pub struct HelmRelease<'k, R: CliRunner = SystemCli> {
    runner: &'k R,
    name: String,
    namespace: String,
    installed: bool,
}

impl<R: CliRunner> HelmRelease<'_, R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn uninstall(mut self) -> Result<(), K8sError> {
        self.remove()
    }

    fn remove(&mut self) -> Result<(), K8sError> {
        if !self.installed {
            return Ok(());
        }
        self.installed = false;
        self.runner.run(
            HELM,
            &[
                "uninstall".to_string(),
                self.name.clone(),
                "--namespace".to_string(),
                self.namespace.clone(),
            ],
        )?;
        info!(release = %self.name, namespace = %self.namespace, "helm release uninstalled");
        Ok(())
    }
}

impl<R: CliRunner> Drop for HelmRelease<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.remove() {
            warn!(release = %self.name, %err, "could not uninstall helm release");
        }
    }
}
