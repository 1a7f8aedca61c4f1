mod error;

use duration_str::deserialize_duration;
use serde::Deserialize;
use std::{
    env,
    ffi::OsString,
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::process::CHILD_SPAWN_TIMEOUT;
use crate::waiter::{DEFAULT_INTERVAL, DEFAULT_TIMEOUT};

pub use error::ConfigError;

/// Variable holding the path of the harness config file.
pub const CONFIG_PATH_ENV: &str = "BOUNCER_FIXTURES_CONFIG";
/// Variable overriding `bouncer_under_test`.
pub const BOUNCER_UNDER_TEST_ENV: &str = "BOUNCER_UNDER_TEST";

pub const DEFAULT_CLUSTER_NAME: &str = "test";

/// Settings shared by the fixtures of a test session.
///
/// ```yaml
/// bouncer_under_test: crowdsec-firewall-bouncer
/// wait:
///   timeout: 5s
///   interval: 100ms
///   child_spawn_timeout: 2s
/// kind:
///   cluster_name: test
///   keep_cluster: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Bouncer binary, relative to the project repository.
    pub bouncer_under_test: Option<PathBuf>,
    pub wait: WaitConfig,
    pub kind: KindConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub child_spawn_timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            child_spawn_timeout: CHILD_SPAWN_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KindConfig {
    pub cluster_name: String,
    /// Leave the cluster running once the session is over, so the next one reuses it.
    pub keep_cluster: bool,
}

impl Default for KindConfig {
    fn default() -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_string(),
            keep_cluster: true,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::IOError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Loads the file pointed by [`CONFIG_PATH_ENV`], if any, and applies the environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var_os(key))
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(bouncer) = lookup(BOUNCER_UNDER_TEST_ENV).filter(|b| !b.is_empty()) {
            config.bouncer_under_test = Some(PathBuf::from(bouncer));
        }
        Ok(config)
    }

    pub fn bouncer_under_test(&self) -> Result<&Path, ConfigError> {
        self.bouncer_under_test
            .as_deref()
            .ok_or(ConfigError::MissingBouncerUnderTest(BOUNCER_UNDER_TEST_ENV))
    }
}
