//! cgroup v2 freezer used to keep a restored container paused
//! See https://www.kernel.org/doc/Documentation/cgroup-v2.txt
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const CGROUP_FREEZE: &str = "cgroup.freeze";
const CGROUP_EVENTS: &str = "cgroup.events";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FreezerState {
    Frozen,
    Thawed,
}

#[derive(Debug, thiserror::Error)]
pub enum FreezerError {
    #[error("freezer not supported at {path:?}")]
    NotSupported {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("expected \"cgroup.freeze\" to be in state {expected:?} but was in {actual:?}")]
    ExpectedToBe {
        expected: FreezerState,
        actual: FreezerState,
    },
    #[error("unexpected \"cgroup.freeze\" state: {0}")]
    UnknownState(String),
    #[error("timeout of {0} ms reached waiting for the cgroup to freeze")]
    Timeout(u128),
}

trait WrapIo<T> {
    fn at(self, path: &Path) -> Result<T, FreezerError>;
}

impl<T> WrapIo<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, FreezerError> {
        self.map_err(|source| FreezerError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub struct Freezer {
    wait_time: Duration,
    max_iter: u32,
}

impl Default for Freezer {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_millis(10),
            max_iter: 1000,
        }
    }
}

impl Freezer {
    pub fn new(wait_time: Duration, max_iter: u32) -> Self {
        Self {
            wait_time,
            max_iter,
        }
    }

    /// Puts the cgroup at `path` into `state` and confirms the transition
    pub fn apply(&self, state: FreezerState, path: &Path) -> Result<(), FreezerError> {
        let state_str = match state {
            FreezerState::Frozen => "1",
            FreezerState::Thawed => "0",
        };

        let target = path.join(CGROUP_FREEZE);
        let mut file = OpenOptions::new()
            .create(false)
            .write(true)
            .open(&target)
            .map_err(|source| FreezerError::NotSupported {
                path: target.clone(),
                source,
            })?;
        file.write_all(state_str.as_bytes()).at(&target)?;

        let actual = self.read_state(path)?;
        if actual != state {
            return Err(FreezerError::ExpectedToBe {
                expected: state,
                actual,
            });
        }

        tracing::debug!(?path, ?state, "cgroup freezer state applied");
        Ok(())
    }

    fn read_state(&self, path: &Path) -> Result<FreezerState, FreezerError> {
        let target = path.join(CGROUP_FREEZE);
        let mut buf = [0; 1];
        OpenOptions::new()
            .read(true)
            .open(&target)
            .at(&target)?
            .read_exact(&mut buf)
            .at(&target)?;

        match &buf {
            b"0" => Ok(FreezerState::Thawed),
            b"1" => self.wait_frozen(path),
            other => Err(FreezerError::UnknownState(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    // polls cgroup.events until it reports "frozen 1"
    fn wait_frozen(&self, path: &Path) -> Result<FreezerState, FreezerError> {
        let path = path.join(CGROUP_EVENTS);
        let file = OpenOptions::new().read(true).open(&path).at(&path)?;
        let mut reader = BufReader::new(file);

        let mut iter = 0;
        let mut line = String::new();
        loop {
            if iter == self.max_iter {
                return Err(FreezerError::Timeout(
                    self.wait_time.as_millis() * u128::from(self.max_iter),
                ));
            }
            line.clear();
            let num_bytes = reader.read_line(&mut line).at(&path)?;
            if num_bytes == 0 {
                // events file without a frozen entry, trust cgroup.freeze
                return Ok(FreezerState::Frozen);
            }
            if line.starts_with("frozen ") {
                if line.starts_with("frozen 1") {
                    if iter > 1 {
                        tracing::debug!("frozen after {} retries", iter);
                    }
                    return Ok(FreezerState::Frozen);
                }
                iter += 1;
                thread::sleep(self.wait_time);
                reader.rewind().at(&path)?;
            }
        }
    }
}
