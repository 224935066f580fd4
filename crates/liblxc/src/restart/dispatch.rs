use std::path::Path;

use super::{RestartError, Result};
use crate::config::LxcConf;
use crate::engine::{RestartFlags, RestoreEngine};

/// Hands the container over to the restore engine. Restoring is not
/// idempotent, so the engine is called once and its result is final.
pub fn dispatch(
    engine: &dyn RestoreEngine,
    name: &str,
    statefile: &Path,
    conf: &LxcConf,
    flags: RestartFlags,
) -> Result<()> {
    tracing::debug!(?statefile, ?flags, "restoring container {}", name);
    engine
        .restore(name, statefile, conf, flags)
        .map_err(|source| RestartError::RestoreFailed {
            name: name.to_owned(),
            statefile: statefile.to_path_buf(),
            source,
        })
}
