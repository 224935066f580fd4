use std::collections::TryReserveError;
use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};

use super::{RestartArgs, RestartError, Result};
use crate::config::CONFIG_FILE_NAME;

/// Where the container configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line, used verbatim
    Explicit(PathBuf),
    /// Found at `<lxcpath>/<name>/config`
    Default(PathBuf),
    /// No configuration, the empty one is used
    None,
}

/// Builds `<lxcpath>/<name>/config`, reserving the buffer up front so that
/// allocation failure is reported instead of aborting.
pub fn default_config_path(
    lxcpath: &Path,
    name: &str,
) -> std::result::Result<PathBuf, TryReserveError> {
    let mut path = PathBuf::new();
    path.try_reserve(lxcpath.as_os_str().len() + name.len() + CONFIG_FILE_NAME.len() + 2)?;
    path.push(lxcpath);
    path.push(name);
    path.push(CONFIG_FILE_NAME);
    Ok(path)
}

pub fn resolve(args: &RestartArgs) -> Result<ConfigSource> {
    if let Some(rcfile) = &args.rcfile {
        tracing::debug!(?rcfile, "using configuration given on the command line");
        return Ok(ConfigSource::Explicit(rcfile.clone()));
    }

    let path =
        default_config_path(&args.lxcpath, &args.name).map_err(RestartError::ResourceExhausted)?;

    // A container may legitimately run without configuration.
    if access(&path, AccessFlags::F_OK).is_err() {
        tracing::debug!(?path, "no configuration found");
        return Ok(ConfigSource::None);
    }

    tracing::debug!(?path, "using default configuration");
    Ok(ConfigSource::Default(path))
}
