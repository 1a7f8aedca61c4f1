pub mod bouncer;
pub mod cli;
pub mod config;
pub mod k8s;
pub mod logging;
pub mod matcher;
pub mod process;
pub mod repo;
pub mod waiter;

pub use crate::bouncer::{BouncerFixture, BouncerProc};
pub use crate::config::HarnessConfig;
pub use crate::matcher::LineMatcher;
pub use crate::waiter::{ContextProvider, Waiter};
