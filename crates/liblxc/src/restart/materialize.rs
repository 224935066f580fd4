use super::{ConfigSource, RestartError, Result};
use crate::config::{ConfigLoader, LxcConf};

/// Creates the configuration and fills it from `source`. A configuration
/// that could not be read completely is never returned.
pub fn materialize(loader: &dyn ConfigLoader, source: &ConfigSource) -> Result<LxcConf> {
    let mut conf = loader
        .init_config()
        .map_err(RestartError::ConfigInitFailed)?;

    match source {
        ConfigSource::Explicit(path) | ConfigSource::Default(path) => {
            loader
                .load_config(path, &mut conf)
                .map_err(|err| RestartError::ConfigLoadFailed {
                    path: path.clone(),
                    source: err,
                })?;
        }
        ConfigSource::None => {}
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        match serde_json::to_string(&conf) {
            Ok(json) => tracing::trace!(%json, "configuration materialized"),
            Err(err) => tracing::trace!(?err, "failed to serialize configuration"),
        }
    }

    Ok(conf)
}
