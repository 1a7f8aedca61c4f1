use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("process `{0}` not found")]
    NotFound(u32),

    #[error("no child process found")]
    NoChildren,

    #[error("no child process named `{0}` found")]
    NoChildNamed(String),

    #[cfg(target_family = "unix")]
    #[error("could not kill process `{pid}`: `{source}`")]
    Kill {
        pid: u32,
        #[source]
        source: nix::Error,
    },

    #[cfg(not(target_family = "unix"))]
    #[error("could not kill process `{0}`")]
    Kill(u32),
}
