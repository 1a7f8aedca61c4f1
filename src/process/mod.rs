//! Minimal view over OS processes: list the children of a process and kill them.

mod error;
mod os;

use std::time::Duration;
use tracing::{debug, info};

use crate::waiter::{ContextProvider, WaitError, Waiter};

pub use error::ProcessError;
pub use os::OsProcess;

/// How long to wait for a child process to spawn.
pub const CHILD_SPAWN_TIMEOUT: Duration = Duration::from_secs(2);

pub trait ProcessHandle {
    fn pid(&self) -> u32;

    fn name(&self) -> &str;

    /// Kills the process. A process that is already gone is not an error.
    fn kill(&self) -> Result<(), ProcessError>;
}

/// Anything that can enumerate its live child processes.
pub trait ChildLister {
    type Handle: ProcessHandle;

    fn children(&self) -> Result<Vec<Self::Handle>, ProcessError>;
}

type ChildOf<P> = <<P as ContextProvider>::Context as ChildLister>::Handle;

/// Waits until the process exposed by `provider` has at least one child and returns the first one.
pub fn wait_for_child<P>(provider: &P, timeout: Duration) -> Result<ChildOf<P>, WaitError<ProcessError>>
where
    P: ContextProvider,
    P::Context: ChildLister,
{
    Waiter::new(provider)
        .with_timeout(timeout)
        .until(|process| {
            process
                .children()
                .and_then(|children| children.into_iter().next().ok_or(ProcessError::NoChildren))
        })
}

/// Same as [`wait_for_child`], only considering children named `name`.
pub fn wait_for_child_named<P>(
    provider: &P,
    name: &str,
    timeout: Duration,
) -> Result<ChildOf<P>, WaitError<ProcessError>>
where
    P: ContextProvider,
    P::Context: ChildLister,
{
    Waiter::new(provider).with_timeout(timeout).until(|process| {
        process.children().and_then(|children| {
            children
                .into_iter()
                .find(|child| child.name() == name)
                .ok_or_else(|| ProcessError::NoChildNamed(name.to_string()))
        })
    })
}

/// Kills every current child of `process`, returning how many were killed.
pub fn halt_children<L>(process: &L) -> Result<usize, ProcessError>
where
    L: ChildLister + ?Sized,
{
    let children = process.children()?;
    for child in &children {
        debug!(pid = child.pid(), name = child.name(), "killing child process");
        child.kill()?;
    }
    info!(count = children.len(), "halted child processes");
    Ok(children.len())
}
