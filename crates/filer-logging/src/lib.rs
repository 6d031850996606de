//! Process-wide `tracing` setup for filer binaries.
//!
//! Events go to stdout and, when `[log.file]` is configured, to a rolling
//! file written from a background thread. `RUST_LOG` overrides the
//! configured filter.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log directory {dir}: {source}")]
    Appender {
        dir: PathBuf,
        source: rolling::InitError,
    },
    #[error("logging already initialised: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    pub dir: PathBuf,
    /// File names are `<prefix>.<date>.log`.
    pub prefix: String,
    pub rotation: Rotation,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("log"),
            prefix: "filer".into(),
            rotation: Rotation::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `info,filer_meta=debug`.
    pub level: String,
    pub format: LogFormat,
    pub stdout: bool,
    pub file: Option<FileLogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
            stdout: true,
            file: None,
        }
    }
}

type DynLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn stdout_layer(format: LogFormat) -> DynLayer {
    match format {
        LogFormat::Text => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    }
}

fn file_writer(config: &FileLogConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Never => rolling::Rotation::NEVER,
    };
    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("log")
        .build(&config.dir)
        .map_err(|source| LoggingError::Appender {
            dir: config.dir.clone(),
            source,
        })?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber. The returned guard flushes the file
/// writer on drop, so keep it alive until exit.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<DynLayer> = Vec::new();
    if config.stdout {
        layers.push(stdout_layer(config.format));
    }
    let mut guard = None;
    if let Some(file) = &config.file {
        let (writer, file_guard) = file_writer(file)?;
        layers.push(match config.format {
            LogFormat::Text => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        });
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;
    Ok(guard)
}
