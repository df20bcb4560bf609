//! Session configuration parsing.
//!
//! ```toml
//! [engine]
//! module = "epanet.wasm"
//! export_prefix = "_"
//!
//! [session]
//! messages = "engine"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! output = "stderr"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from a TOML file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where the engine module lives and how its exports are named.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the compiled EPANET module.
    pub module: Option<PathBuf>,
    /// Prefix tried when an export is missing under its plain name.
    pub export_prefix: String,
    pub memory_export: String,
    pub malloc_export: String,
    pub free_export: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module: None,
            export_prefix: "_".to_string(),
            memory_export: "memory".to_string(),
            malloc_export: "malloc".to_string(),
            free_export: "free".to_string(),
        }
    }
}

#[cfg(feature = "wasm")]
impl EngineConfig {
    /// Export naming for [`WasmtimeEngine`](crate::engine::WasmtimeEngine).
    pub fn options(&self) -> crate::engine::EngineOptions {
        crate::engine::EngineOptions {
            export_prefix: self.export_prefix.clone(),
            memory_export: self.memory_export.clone(),
            malloc_export: self.malloc_export.clone(),
            free_export: self.free_export.clone(),
        }
    }
}

/// Per-session behavior.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub messages: MessageSource,
}

/// Where status-code messages come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// Ask the engine (`EN_geterror`), falling back to built-in text.
    #[default]
    Engine,
    /// Built-in text only.
    Static,
}

impl MessageSource {
    pub fn lookup(self) -> Box<dyn crate::status::ErrorMessages> {
        match self {
            Self::Engine => Box::new(crate::status::EngineMessages),
            Self::Static => Box::new(crate::status::StaticMessages),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"epanet_wasm=trace"`.
    pub level: String,
    pub format: LogFormat,
    /// `"stdout"`, `"stderr"`, or a file path to append to.
    pub output: String,
    pub color: bool,
    pub timestamps: bool,
    /// Include the event target (module path).
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            output: "stderr".to_string(),
            color: true,
            timestamps: true,
            target: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(String, std::io::Error),
    /// TOML parse error.
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Failed to read config file '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[engine]
module = "build/epanet.wasm"
export_prefix = ""

[session]
messages = "static"

[logging]
level = "epanet_wasm=debug"
format = "json"
output = "stdout"
timestamps = false
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.engine.module, Some(PathBuf::from("build/epanet.wasm")));
        assert_eq!(config.engine.export_prefix, "");
        assert_eq!(config.engine.malloc_export, "malloc");
        assert_eq!(config.session.messages, MessageSource::Static);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.output, "stdout");
        assert!(!config.logging.timestamps);
        assert!(config.logging.color);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert!(config.engine.module.is_none());
        assert_eq!(config.engine.export_prefix, "_");
        assert_eq!(config.session.messages, MessageSource::Engine);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_unknown_message_source_is_rejected() {
        let err = Config::from_str("[session]\nmessages = \"remote\"").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }
}
