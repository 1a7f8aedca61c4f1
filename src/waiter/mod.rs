//! Retry-until-success polling.
//!
//! A [`Waiter`] hands the same context object to a check over and over until the
//! check passes or the configured timeout elapses. The check can be written as a
//! closure passed to [`Waiter::until`], or as the body of a loop over the
//! [`Attempt`] guards produced by a [`WaitCycle`]:
//!
//! ```ignore
//! let cycle = Waiter::new(&bouncer).cycle();
//! for attempt in &cycle {
//!     let attempt = attempt?;
//!     if let Err(err) = attempt.output()?.fnmatch_lines(&["*started*"]) {
//!         attempt.fail(err);
//!     }
//! }
//! cycle.finish()?;
//! ```
//!
//! The first attempt is always made, even with a zero timeout. Failures of the
//! check are retried; failures to obtain the context are not.

mod error;

use std::{
    cell::{Cell, RefCell},
    ops::Deref,
    thread::sleep,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

pub use error::{ContextError, WaitError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Source of the object a wait cycle inspects on every attempt.
///
/// Implementations must return the same object on every call: the waiter never
/// creates nor destroys it.
pub trait ContextProvider {
    type Context: ?Sized;

    fn context(&self) -> Result<&Self::Context, ContextError>;
}

#[derive(Debug)]
pub struct Waiter<'p, P: ?Sized> {
    provider: &'p P,
    timeout: Duration,
    interval: Duration,
}

impl<'p, P> Waiter<'p, P>
where
    P: ContextProvider + ?Sized,
{
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts a new wait cycle. The deadline is computed now.
    pub fn cycle<E>(&self) -> WaitCycle<'p, P, E> {
        WaitCycle::start(self.provider, self.timeout, self.interval)
    }

    /// Runs `check` against the context until it returns `Ok` or the deadline passes,
    /// in which case the error of the last attempt is returned inside [`WaitError::Timeout`].
    pub fn until<T, E, F>(&self, mut check: F) -> Result<T, WaitError<E>>
    where
        F: FnMut(&P::Context) -> Result<T, E>,
    {
        let cycle = self.cycle();
        for attempt in &cycle {
            let attempt = attempt?;
            match check(attempt.context()) {
                Ok(value) => return Ok(value),
                Err(err) => attempt.fail(err),
            }
        }
        Err(cycle.into_error())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleState {
    Init,
    Attempting,
    Failed,
    Passed,
    Exhausted,
    Aborted,
}

/// One bounded sequence of attempts. Iterate over `&cycle` to get the attempts.
pub struct WaitCycle<'p, P: ?Sized, E> {
    provider: &'p P,
    interval: Duration,
    started: Instant,
    // None when the timeout is too large to be represented
    deadline: Option<Instant>,
    attempts: Cell<usize>,
    state: Cell<CycleState>,
    last_error: RefCell<Option<E>>,
}

impl<'p, P, E> WaitCycle<'p, P, E>
where
    P: ContextProvider + ?Sized,
{
    fn start(provider: &'p P, timeout: Duration, interval: Duration) -> Self {
        let started = Instant::now();
        Self {
            provider,
            interval,
            started,
            deadline: started.checked_add(timeout),
            attempts: Cell::new(0),
            state: Cell::new(CycleState::Init),
            last_error: RefCell::new(None),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.get()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn passed(&self) -> bool {
        self.state.get() == CycleState::Passed
    }

    /// Consumes the cycle: `Ok` if the last attempt passed, the failure otherwise.
    ///
    /// Only a cycle that ran out of time is a [`WaitError::Timeout`]. Leaving the loop
    /// earlier, or never entering it, gives [`WaitError::Interrupted`].
    pub fn finish(self) -> Result<(), WaitError<E>> {
        match self.state.get() {
            CycleState::Passed | CycleState::Attempting => Ok(()),
            _ => Err(self.into_error()),
        }
    }

    fn into_error(self) -> WaitError<E> {
        let attempts = self.attempts.get();
        let elapsed = self.started.elapsed();
        let exhausted = self.state.get() == CycleState::Exhausted;
        match self.last_error.into_inner() {
            Some(last_error) if exhausted => WaitError::Timeout {
                last_error,
                attempts,
                elapsed,
            },
            last_error => WaitError::Interrupted {
                last_error,
                attempts,
                elapsed,
            },
        }
    }

    fn remaining(&self) -> Option<Duration> {
        match self.deadline {
            Some(deadline) => {
                let now = Instant::now();
                (now < deadline).then(|| deadline - now)
            }
            None => Some(self.interval),
        }
    }

    fn next_attempt<'c>(&'c self) -> Option<Result<Attempt<'c, 'p, P, E>, WaitError<E>>> {
        match self.state.get() {
            CycleState::Init => {}
            CycleState::Failed => {
                let Some(remaining) = self.remaining() else {
                    self.state.set(CycleState::Exhausted);
                    warn!(
                        attempts = self.attempts.get(),
                        elapsed = ?self.started.elapsed(),
                        "condition not met before the deadline"
                    );
                    return None;
                };
                let pause = self.interval.min(remaining);
                debug!(
                    attempt = self.attempts.get(),
                    "condition not met, retrying in {pause:?}"
                );
                sleep(pause);
            }
            // the guard of the previous attempt is still alive and reported no failure
            CycleState::Attempting => {
                self.state.set(CycleState::Passed);
                return None;
            }
            CycleState::Passed | CycleState::Exhausted | CycleState::Aborted => return None,
        }

        self.attempts.set(self.attempts.get() + 1);
        match self.provider.context() {
            Ok(context) => {
                self.state.set(CycleState::Attempting);
                Some(Ok(Attempt {
                    cycle: self,
                    context,
                    number: self.attempts.get(),
                }))
            }
            Err(err) => {
                self.state.set(CycleState::Aborted);
                Some(Err(WaitError::Context(err)))
            }
        }
    }
}

pub struct Attempts<'c, 'p, P: ?Sized, E> {
    cycle: &'c WaitCycle<'p, P, E>,
}

impl<'c, 'p, P, E> Iterator for Attempts<'c, 'p, P, E>
where
    P: ContextProvider + ?Sized,
{
    type Item = Result<Attempt<'c, 'p, P, E>, WaitError<E>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cycle.next_attempt()
    }
}

impl<'c, 'p, P, E> IntoIterator for &'c WaitCycle<'p, P, E>
where
    P: ContextProvider + ?Sized,
{
    type Item = Result<Attempt<'c, 'p, P, E>, WaitError<E>>;
    type IntoIter = Attempts<'c, 'p, P, E>;

    fn into_iter(self) -> Self::IntoIter {
        Attempts { cycle: self }
    }
}

/// Scope guard for a single attempt.
///
/// Entering is [`Attempt::context`] (or dereferencing the guard). Leaving the scope
/// without calling [`Attempt::fail`] counts as a pass and ends the cycle.
pub struct Attempt<'c, 'p, P, E>
where
    P: ContextProvider + ?Sized,
{
    cycle: &'c WaitCycle<'p, P, E>,
    context: &'p P::Context,
    number: usize,
}

impl<'c, 'p, P, E> Attempt<'c, 'p, P, E>
where
    P: ContextProvider + ?Sized,
{
    pub fn context(&self) -> &'p P::Context {
        self.context
    }

    /// 1-based position of this attempt in its cycle.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Records the failure of this attempt. The cycle retries if time remains.
    pub fn fail(self, err: E) {
        *self.cycle.last_error.borrow_mut() = Some(err);
        self.cycle.state.set(CycleState::Failed);
    }

    /// Runs `check` against the context, recording its failure. Returns the value on success.
    pub fn check<T, F>(self, check: F) -> Option<T>
    where
        F: FnOnce(&P::Context) -> Result<T, E>,
    {
        match check(self.context) {
            Ok(value) => Some(value),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }
}

impl<P, E> Deref for Attempt<'_, '_, P, E>
where
    P: ContextProvider + ?Sized,
{
    type Target = P::Context;

    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl<P, E> Drop for Attempt<'_, '_, P, E>
where
    P: ContextProvider + ?Sized,
{
    fn drop(&mut self) {
        if self.cycle.state.get() == CycleState::Attempting {
            self.cycle.state.set(CycleState::Passed);
        }
    }
}
