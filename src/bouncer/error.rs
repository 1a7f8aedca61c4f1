use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::matcher::LineMatchError;
use crate::process::ProcessError;

#[derive(Error, Debug)]
pub enum BouncerError {
    #[error("bouncer binary not found at `{0}`. Did you build it?")]
    BinaryNotFound(PathBuf),

    #[error("io error on `{path}`: `{source}`")]
    IOError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize the bouncer config: `{0}`")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("could not spawn `{binary}`: `{source}`")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not stop bouncer `{pid}`: `{source}`")]
    Stop {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("process error: `{0}`")]
    Process(#[from] ProcessError),

    #[error("{0}")]
    Lines(#[from] LineMatchError),

    #[error("config error: `{0}`")]
    Config(#[from] ConfigError),
}

impl BouncerError {
    pub(super) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::IOError { path, source }
    }
}
