//! Tracing subscriber setup for the command-line tool.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};

use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install a global subscriber according to `config`.
///
/// `RUST_LOG`, when set, overrides `config.level`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;

    let layer = match config.output.as_str() {
        "stdout" => build_layer(config, io::stdout().is_terminal(), io::stdout),
        "stderr" => build_layer(config, io::stderr().is_terminal(), io::stderr),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| LoggingError::FileOpen(path.to_string(), e))?;
            build_layer(config, false, file)
        }
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn build_layer<W>(config: &LoggingConfig, terminal: bool, writer: W) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer);

    match (config.format, config.timestamps) {
        (LogFormat::Text, true) => base.with_ansi(config.color && terminal).boxed(),
        (LogFormat::Text, false) => base.with_ansi(config.color && terminal).without_time().boxed(),
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug)]
pub enum LoggingError {
    /// Invalid log filter string.
    InvalidFilter(String),
    /// Failed to open log file.
    FileOpen(String, io::Error),
    /// A global subscriber was already installed.
    AlreadyInitialized(String),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFilter(msg) => write!(f, "Invalid log filter: {}", msg),
            LoggingError::FileOpen(path, e) => {
                write!(f, "Failed to open log file '{}': {}", path, e)
            }
            LoggingError::AlreadyInitialized(msg) => {
                write!(f, "Logging already initialized: {}", msg)
            }
        }
    }
}

impl std::error::Error for LoggingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_reported() {
        let config = LoggingConfig {
            level: "epanet_wasm=loud".to_string(),
            ..LoggingConfig::default()
        };
        // Only meaningful when RUST_LOG does not override the level.
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert!(matches!(init(&config), Err(LoggingError::InvalidFilter(_))));
        }
    }

    #[test]
    fn test_file_output_opens_in_append_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.txt");
        let config = LoggingConfig {
            output: path.display().to_string(),
            level: "info".to_string(),
            ..LoggingConfig::default()
        };
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert!(matches!(init(&config), Err(LoggingError::FileOpen(..))));
        }
    }
}
