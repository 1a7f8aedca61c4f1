use std::{error::Error as StdError, time::Duration};
use thiserror::Error;

/// Failure to obtain the context a wait cycle inspects. It is never retried.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ContextError(Box<dyn StdError + Send + Sync>);

impl ContextError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self(err.into())
    }
}

#[derive(Error, Debug)]
pub enum WaitError<E> {
    #[error("wait context unavailable: `{0}`")]
    Context(#[from] ContextError),

    /// The deadline passed and the last attempt still failed. Displays the
    /// failure of that attempt unchanged.
    #[error("{last_error}")]
    Timeout {
        last_error: E,
        attempts: usize,
        elapsed: Duration,
    },

    /// The cycle was left before its deadline, with the failure of its last attempt
    /// if that attempt failed.
    #[error("wait cycle left after {attempts} attempts in {elapsed:?}")]
    Interrupted {
        last_error: Option<E>,
        attempts: usize,
        elapsed: Duration,
    },
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Timeout { last_error, .. } => Some(last_error),
            Self::Interrupted { last_error, .. } => last_error.as_ref(),
            Self::Context(_) => None,
        }
    }

    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Timeout { last_error, .. } => Some(last_error),
            Self::Interrupted { last_error, .. } => last_error,
            Self::Context(_) => None,
        }
    }

    /// Number of attempts made, unless the context was never obtained.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::Timeout { attempts, .. } | Self::Interrupted { attempts, .. } => Some(*attempts),
            Self::Context(_) => None,
        }
    }
}
