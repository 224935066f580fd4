//! Restore engines
//! An engine rebuilds a running container from a state file. The restart
//! flow only sees the [`RestoreEngine`] trait.
use std::path::{Path, PathBuf};

use bitflags::bitflags;

use crate::config::LxcConf;

mod criu;
pub mod freezer;

pub use self::criu::CriuEngine;
pub use freezer::FreezerError;

bitflags! {
    /// Behavior of the restored container
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct RestartFlags: u32 {
        /// Do not release the container once it has been restored
        const PAUSE = 0b0000_0001;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("failed to open state file {path:?}")]
    StateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("criu failed: {0}")]
    Criu(String),
    #[error("failed to pause restored container")]
    Freeze(#[from] FreezerError),
}

pub trait RestoreEngine {
    /// Restores the container `name` from `statefile`. Called exactly once
    /// per restart; implementations own any rollback.
    fn restore(
        &self,
        name: &str,
        statefile: &Path,
        conf: &LxcConf,
        flags: RestartFlags,
    ) -> Result<(), RestoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_resume() {
        let flags = RestartFlags::default();
        assert!(flags.is_empty());
        assert!(!flags.contains(RestartFlags::PAUSE));
    }
}
