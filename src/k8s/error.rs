use super::cli::CliError;

#[derive(thiserror::Error, Debug)]
pub enum K8sError {
    #[error("cluster tooling failed: `{0}`")]
    Cli(#[from] CliError),

    #[error("io error: `{0}`")]
    IOError(#[from] std::io::Error),

    #[error("kind cluster `{0}` is not running")]
    ClusterNotRunning(String),
}
