#[cfg(target_family = "unix")]
use nix::{errno::Errno, sys::signal, unistd::Pid as NixPid};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, RefreshKind, System};
use tracing::debug;

use super::{ChildLister, ProcessError, ProcessHandle};
use crate::waiter::{ContextError, ContextProvider};

/// A process of the host, looked up in the OS process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsProcess {
    pid: u32,
    name: String,
}

fn process_table() -> System {
    System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()))
}

impl OsProcess {
    pub fn from_pid(pid: u32) -> Self {
        let name = process_table()
            .process(Pid::from_u32(pid))
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        Self { pid, name }
    }

    /// Zombies are not considered running.
    pub fn is_running(&self) -> bool {
        process_table()
            .process(Pid::from_u32(self.pid))
            .is_some_and(|p| p.status() != ProcessStatus::Zombie)
    }
}

impl ProcessHandle for OsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> &str {
        &self.name
    }

    #[cfg(target_family = "unix")]
    fn kill(&self) -> Result<(), ProcessError> {
        match signal::kill(NixPid::from_raw(self.pid as i32), signal::SIGKILL) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!(pid = self.pid, "process already gone");
                Ok(())
            }
            Err(source) => Err(ProcessError::Kill {
                pid: self.pid,
                source,
            }),
        }
    }

    #[cfg(not(target_family = "unix"))]
    fn kill(&self) -> Result<(), ProcessError> {
        match process_table().process(Pid::from_u32(self.pid)) {
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(ProcessError::Kill(self.pid)),
            None => {
                debug!(pid = self.pid, "process already gone");
                Ok(())
            }
        }
    }
}

impl ChildLister for OsProcess {
    type Handle = OsProcess;

    fn children(&self) -> Result<Vec<OsProcess>, ProcessError> {
        let parent = Pid::from_u32(self.pid);
        let table = process_table();
        // on Linux threads are listed as processes whose parent is their thread group leader
        let threads = table.process(parent).and_then(|p| p.tasks());
        let mut children: Vec<OsProcess> = table
            .processes()
            .iter()
            .filter(|(pid, p)| {
                p.parent() == Some(parent)
                    && p.status() != ProcessStatus::Zombie
                    && !threads.is_some_and(|tasks| tasks.contains(*pid))
            })
            .map(|(pid, p)| OsProcess {
                pid: pid.as_u32(),
                name: p.name().to_string(),
            })
            .collect();
        // oldest first, as far as pids tell
        children.sort_by_key(|c| c.pid);
        Ok(children)
    }
}

impl ContextProvider for OsProcess {
    type Context = OsProcess;

    fn context(&self) -> Result<&Self::Context, ContextError> {
        if self.is_running() {
            Ok(self)
        } else {
            Err(ContextError::new(ProcessError::NotFound(self.pid)))
        }
    }
}
