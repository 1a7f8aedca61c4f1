//! Local Kubernetes environment for the higher level scenarios, driven through the
//! `kind` and `helm` command line tools.

pub mod cli;
mod error;
pub mod helm;
pub mod kind;

pub use cli::{CliError, CliOutput, CliRunner, SystemCli};
pub use error::K8sError;
pub use helm::{Helm, HelmRelease};
pub use kind::KindCluster;
