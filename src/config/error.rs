use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading config `{path}`: `{source}`")]
    IOError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: `{0}`")]
    InvalidYamlConfiguration(#[from] serde_yaml::Error),

    #[error("no bouncer under test configured, set `bouncer_under_test` or the `{0}` variable")]
    MissingBouncerUnderTest(&'static str),
}
