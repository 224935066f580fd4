use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

const LOG_FORMAT_TEXT: &str = "text";
const LOG_FORMAT_JSON: &str = "json";
enum LogFormat {
    Text,
    Json,
}

/// Only errors are reported unless asked otherwise
const DEFAULT_LOG_LEVEL: Level = Level::ERROR;

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync>;

fn detect_log_format(log_format: Option<&str>) -> Result<LogFormat> {
    match log_format {
        None | Some(LOG_FORMAT_TEXT) => Ok(LogFormat::Text),
        Some(LOG_FORMAT_JSON) => Ok(LogFormat::Json),
        Some(unknown) => bail!("unknown log format: {}", unknown),
    }
}

// The lxc priorities are coarser at the top: notice maps to info and the
// critical ones all map to error.
fn detect_log_level(input: Option<&str>) -> Result<Level> {
    let priority = match input {
        None => return Ok(DEFAULT_LOG_LEVEL),
        Some(priority) => priority.to_ascii_lowercase(),
    };

    let level = match priority.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" | "notice" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "crit" | "alert" | "fatal" => Level::ERROR,
        _ => bail!("invalid log priority: {}", input.unwrap_or_default()),
    };
    Ok(level)
}

#[derive(Debug, Default)]
pub struct ObservabilityConfig {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_format: Option<String>,
    pub quiet: bool,
}

impl From<&crate::Opts> for ObservabilityConfig {
    fn from(opts: &crate::Opts) -> Self {
        Self {
            log_level: opts.global.logpriority.to_owned(),
            log_file: opts.global.logfile.to_owned(),
            log_format: opts.global.log_format.to_owned(),
            quiet: opts.global.quiet,
        }
    }
}

/// Keeps logging active. Dropping it uninstalls the subscriber and flushes
/// the log file.
pub struct ObservabilityGuard {
    _default: DefaultGuard,
    log_file: Option<Arc<File>>,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.log_file {
            let _ = (&**file).flush();
        }
    }
}

pub fn init<T>(config: T) -> Result<ObservabilityGuard>
where
    T: Into<ObservabilityConfig>,
{
    let config = config.into();
    let level = detect_log_level(config.log_level.as_deref())
        .with_context(|| "failed to parse log priority")?;
    let log_format = detect_log_format(config.log_format.as_deref())
        .with_context(|| "failed to detect log format")?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let log_file = match config.log_file.as_ref() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path:?}"))?;
            let file = Arc::new(file);
            layers.push(file_layer(&log_format, file.clone(), LevelFilter::from_level(level)));
            Some(file)
        }
        None => None,
    };

    // With a log file, stderr only carries errors. Quiet mode silences it.
    if !config.quiet {
        let stderr_level = if log_file.is_some() {
            LevelFilter::ERROR
        } else {
            LevelFilter::from_level(level)
        };
        layers.push(stderr_layer(&log_format, stderr_level));
    }

    let subscriber = tracing_subscriber::registry().with(layers);
    let default = tracing::subscriber::set_default(subscriber);

    Ok(ObservabilityGuard {
        _default: default,
        log_file,
    })
}

fn file_layer(format: &LogFormat, file: Arc<File>, filter: LevelFilter) -> BoxedLayer {
    match format {
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file)
                .with_filter(filter),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_span_list(false)
                .with_writer(file)
                .with_filter(filter),
        ),
    }
}

fn stderr_layer(format: &LogFormat, filter: LevelFilter) -> BoxedLayer {
    match format {
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_span_list(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        ),
    }
}
