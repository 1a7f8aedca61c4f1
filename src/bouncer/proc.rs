use std::{
    fs,
    path::{Path, PathBuf},
    process::{Child, ExitStatus},
    sync::Arc,
    time::Duration,
};
use tempfile::TempDir;
use tracing::{debug, warn};

use super::BouncerError;
use crate::config::WaitConfig;
use crate::matcher::LineMatcher;
use crate::process::{self, ChildLister, OsProcess, ProcessError};
use crate::waiter::{ContextError, ContextProvider, WaitError, Waiter};

/// A running bouncer. Its stdout and stderr go to a single output file.
///
/// The process is killed and reaped when dropped.
#[derive(Debug)]
pub struct BouncerProc {
    child: Child,
    process: OsProcess,
    config_path: PathBuf,
    output_path: PathBuf,
    wait: WaitConfig,
    // keeps the output directory around for as long as the process lives
    _root: Arc<TempDir>,
}

impl BouncerProc {
    pub(super) fn new(
        child: Child,
        config_path: PathBuf,
        output_path: PathBuf,
        wait: WaitConfig,
        root: Arc<TempDir>,
    ) -> Self {
        let process = OsProcess::from_pid(child.id());
        Self {
            child,
            process,
            config_path,
            output_path,
            wait,
            _root: root,
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn process(&self) -> &OsProcess {
        &self.process
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn children(&self) -> Result<Vec<OsProcess>, ProcessError> {
        self.process.children()
    }

    /// Waits for at least one child process to spawn.
    pub fn wait_for_child(&self) -> Result<OsProcess, WaitError<ProcessError>> {
        self.wait_for_child_with_timeout(self.wait.child_spawn_timeout)
    }

    pub fn wait_for_child_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<OsProcess, WaitError<ProcessError>> {
        process::wait_for_child(self, timeout)
    }

    pub fn wait_for_child_named(&self, name: &str) -> Result<OsProcess, WaitError<ProcessError>> {
        process::wait_for_child_named(self, name, self.wait.child_spawn_timeout)
    }

    pub fn halt_children(&self) -> Result<usize, ProcessError> {
        process::halt_children(&self.process)
    }

    /// Everything the bouncer wrote so far.
    pub fn output(&self) -> Result<LineMatcher, BouncerError> {
        let text = fs::read_to_string(&self.output_path).map_err(BouncerError::io(&self.output_path))?;
        Ok(LineMatcher::from_text(&text))
    }

    /// Waits until the output matches `patterns` in order, see [`LineMatcher::fnmatch_lines`].
    pub fn wait_for_lines_fnmatch<S: AsRef<str>>(&self, patterns: &[S]) -> Result<(), WaitError<BouncerError>> {
        self.wait_for_lines_fnmatch_with_timeout(patterns, self.wait.timeout)
    }

    pub fn wait_for_lines_fnmatch_with_timeout<S: AsRef<str>>(
        &self,
        patterns: &[S],
        timeout: Duration,
    ) -> Result<(), WaitError<BouncerError>> {
        let output = CapturedOutput(self);
        Waiter::new(&output)
            .with_timeout(timeout)
            .with_interval(self.wait.interval)
            .until(|bouncer| -> Result<(), BouncerError> {
                bouncer.output()?.fnmatch_lines(patterns)?;
                Ok(())
            })
    }

    /// Kills the bouncer if still running and returns its exit status.
    pub fn stop(&mut self) -> Result<ExitStatus, BouncerError> {
        let pid = self.pid();
        let stop_error = |source| BouncerError::Stop { pid, source };
        if let Some(status) = self.child.try_wait().map_err(stop_error)? {
            return Ok(status);
        }
        debug!(pid, "killing bouncer");
        self.child.kill().map_err(stop_error)?;
        self.child.wait().map_err(stop_error)
    }
}

/// Fails once the bouncer has exited, so waits on its children end early.
impl ContextProvider for BouncerProc {
    type Context = BouncerProc;

    fn context(&self) -> Result<&Self::Context, ContextError> {
        if self.process.is_running() {
            Ok(self)
        } else {
            Err(ContextError::new(ProcessError::NotFound(self.pid())))
        }
    }
}

// The output file stays readable after the bouncer exits.
struct CapturedOutput<'a>(&'a BouncerProc);

impl ContextProvider for CapturedOutput<'_> {
    type Context = BouncerProc;

    fn context(&self) -> Result<&Self::Context, ContextError> {
        Ok(self.0)
    }
}

impl ChildLister for BouncerProc {
    type Handle = OsProcess;

    fn children(&self) -> Result<Vec<OsProcess>, ProcessError> {
        self.process.children()
    }
}

impl Drop for BouncerProc {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(pid = self.pid(), %err, "could not stop bouncer");
        }
    }
}
