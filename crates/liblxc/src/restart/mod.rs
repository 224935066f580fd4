//! Restart of a checkpointed container
//! A restart is a single linear pass: the arguments are validated, the
//! configuration source is resolved and materialized, and the restore
//! engine is invoked exactly once. Any failure ends the pass; nothing is
//! retried or rolled back here.
use std::collections::TryReserveError;
use std::fmt;
use std::path::PathBuf;

use crate::config::{ConfigError, ConfigLoader};
use crate::engine::{RestartFlags, RestoreEngine, RestoreError};

mod dispatch;
mod materialize;
mod resolve;
mod validate;

pub use dispatch::dispatch;
pub use materialize::materialize;
pub use resolve::{default_config_path, resolve, ConfigSource};
pub use validate::validate;

/// Default directory holding one sub directory per container
pub const LXCPATH: &str = "/var/lib/lxc";

#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    #[error("no {field} specified")]
    MissingRequiredArgument { field: &'static str },
    #[error("failed to allocate memory")]
    ResourceExhausted(#[source] TryReserveError),
    #[error("failed to initialize configuration")]
    ConfigInitFailed(#[source] ConfigError),
    #[error("failed to read configuration file {path:?}")]
    ConfigLoadFailed {
        path: PathBuf,
        source: ConfigError,
    },
    #[error("failed to restart container {name} from {statefile:?}")]
    RestoreFailed {
        name: String,
        statefile: PathBuf,
        source: RestoreError,
    },
}

type Result<T> = std::result::Result<T, RestartError>;

/// Arguments of one restart invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartArgs {
    pub name: String,
    pub statefile: Option<PathBuf>,
    pub rcfile: Option<PathBuf>,
    pub pause: bool,
    pub lxcpath: PathBuf,
}

impl RestartArgs {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            statefile: None,
            rcfile: None,
            pause: false,
            lxcpath: PathBuf::from(LXCPATH),
        }
    }

    pub fn with_statefile<P: Into<PathBuf>>(mut self, statefile: P) -> Self {
        self.statefile = Some(statefile.into());
        self
    }

    pub fn with_rcfile<P: Into<PathBuf>>(mut self, rcfile: P) -> Self {
        self.rcfile = Some(rcfile.into());
        self
    }

    pub fn with_pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_lxcpath<P: Into<PathBuf>>(mut self, lxcpath: P) -> Self {
        self.lxcpath = lxcpath.into();
        self
    }

    pub fn flags(&self) -> RestartFlags {
        if self.pause {
            RestartFlags::PAUSE
        } else {
            RestartFlags::empty()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartState {
    Start,
    Validated,
    Resolved,
    Materialized,
    Dispatched,
    Succeeded,
    Failed,
}

impl fmt::Display for RestartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let print = match self {
            Self::Start => "Start",
            Self::Validated => "Validated",
            Self::Resolved => "Resolved",
            Self::Materialized => "Materialized",
            Self::Dispatched => "Dispatched",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        };

        write!(f, "{print}")
    }
}

/// Drives one restart through its states
pub struct Restart<'a> {
    loader: &'a dyn ConfigLoader,
    engine: &'a dyn RestoreEngine,
    state: RestartState,
}

impl<'a> Restart<'a> {
    pub fn new(loader: &'a dyn ConfigLoader, engine: &'a dyn RestoreEngine) -> Self {
        Self {
            loader,
            engine,
            state: RestartState::Start,
        }
    }

    pub fn state(&self) -> RestartState {
        self.state
    }

    /// Runs the restart. The engine result is returned as is.
    pub fn run(&mut self, args: &RestartArgs) -> Result<()> {
        let result = self.run_steps(args);
        match &result {
            Ok(()) => self.transition(RestartState::Succeeded),
            Err(err) => {
                tracing::error!(state = %self.state, "restart of {} failed: {}", args.name, err);
                self.transition(RestartState::Failed)
            }
        }
        result
    }

    fn run_steps(&mut self, args: &RestartArgs) -> Result<()> {
        let statefile = validate(args)?;
        self.transition(RestartState::Validated);

        let source = resolve(args)?;
        self.transition(RestartState::Resolved);

        let conf = materialize(self.loader, &source)?;
        self.transition(RestartState::Materialized);

        self.transition(RestartState::Dispatched);
        dispatch(self.engine, &args.name, statefile, &conf, args.flags())
    }

    fn transition(&mut self, next: RestartState) {
        tracing::debug!("restart state {} -> {}", self.state, next);
        self.state = next;
    }
}
