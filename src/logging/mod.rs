use std::fmt::Debug;
use thiserror::Error;
use tracing::metadata::LevelFilter;
use tracing_subscriber::fmt::format::PrettyFields;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("init logging error: `{0}`")]
    TryInitError(String),
}

pub struct Logging;

impl Logging {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
    pub fn try_init(level: LevelFilter) -> Result<(), LoggingError> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .from_env_lossy(),
            )
            .fmt_fields(PrettyFields::new())
            .try_init()
            .map_err(|_| {
                LoggingError::TryInitError("unable to set fixtures global logging subscriber".to_string())
            })
    }

    /// Same as [`Logging::try_init`] at `info`, writing through the test harness capture.
    /// Only the first call in a test binary installs the subscriber.
    pub fn init_for_tests() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .try_init();
    }
}
