//! Launches the bouncer under test with a generated configuration and captures its output.

mod binary;
mod error;
mod proc;

use serde::Serialize;
use std::{
    cell::Cell,
    fs::{self, File},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
};
use tempfile::TempDir;
use tracing::info;

use crate::config::{HarnessConfig, WaitConfig};

pub use binary::locate_bouncer_binary;
pub use error::BouncerError;
pub use proc::BouncerProc;

pub const CONFIG_FILE_NAME: &str = "bouncer-config.yaml";
pub const LOCAL_CONFIG_FILE_NAME: &str = "bouncer-config.yaml.local";
pub const OUTPUT_FILE_NAME: &str = "output.txt";

/// Launches bouncers of the same binary, each one in its own output directory.
#[derive(Debug)]
pub struct BouncerFixture {
    binary: PathBuf,
    root: Arc<TempDir>,
    wait: WaitConfig,
    launched: Cell<usize>,
}

impl BouncerFixture {
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self, BouncerError> {
        let root = tempfile::Builder::new()
            .prefix("bouncer-fixtures")
            .tempdir()
            .map_err(BouncerError::io(std::env::temp_dir()))?;
        Ok(Self {
            binary: binary.into(),
            root: Arc::new(root),
            wait: WaitConfig::default(),
            launched: Cell::new(0),
        })
    }

    /// Locates the bouncer under test in `project_repo` and applies the wait settings.
    pub fn from_config(config: &HarnessConfig, project_repo: &Path) -> Result<Self, BouncerError> {
        let binary = locate_bouncer_binary(project_repo, config.bouncer_under_test()?)?;
        Ok(Self::new(binary)?.with_wait_config(config.wait.clone()))
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Starts the bouncer with `config` written as its YAML config file.
    pub fn launch<C>(&self, config: &C) -> Result<BouncerProc, BouncerError>
    where
        C: Serialize + ?Sized,
    {
        self.spawn(serde_yaml::to_string(config)?, None)
    }

    /// Same as [`BouncerFixture::launch`], also writing `config_local` next to the config
    /// file as its `.local` override.
    pub fn launch_with_local<C, L>(&self, config: &C, config_local: &L) -> Result<BouncerProc, BouncerError>
    where
        C: Serialize + ?Sized,
        L: Serialize + ?Sized,
    {
        self.spawn(
            serde_yaml::to_string(config)?,
            Some(serde_yaml::to_string(config_local)?),
        )
    }

    fn next_output_dir(&self) -> Result<PathBuf, BouncerError> {
        let index = self.launched.get();
        self.launched.set(index + 1);
        let dir = self.root.path().join(format!("output{index}"));
        fs::create_dir(&dir).map_err(BouncerError::io(&dir))?;
        Ok(dir)
    }

    fn spawn(&self, config: String, config_local: Option<String>) -> Result<BouncerProc, BouncerError> {
        let out_dir = self.next_output_dir()?;

        let config_path = out_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, config).map_err(BouncerError::io(&config_path))?;

        if let Some(config_local) = config_local {
            let local_path = out_dir.join(LOCAL_CONFIG_FILE_NAME);
            fs::write(&local_path, config_local).map_err(BouncerError::io(&local_path))?;
        }

        // joint stdout/stderr file
        let output_path = out_dir.join(OUTPUT_FILE_NAME);
        let output = File::create(&output_path).map_err(BouncerError::io(&output_path))?;
        let stderr = output.try_clone().map_err(BouncerError::io(&output_path))?;

        let child = Command::new(&self.binary)
            .arg("-c")
            .arg(&config_path)
            .stdout(Stdio::from(output))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| BouncerError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        info!(
            pid = child.id(),
            binary = %self.binary.display(),
            config = %config_path.display(),
            "bouncer launched"
        );

        Ok(BouncerProc::new(
            child,
            config_path,
            output_path,
            self.wait.clone(),
            Arc::clone(&self.root),
        ))
    }
}
