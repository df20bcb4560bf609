//! Unified error type for the epanet-wasm library.
//!
//! Every failure a facade call can produce is a variant of [`Error`]. Each
//! variant carries the method name plus the context needed to diagnose the
//! failure (expected vs. actual counts, required vs. loaded version, the
//! offending status code and its message).
//!
//! Non-fatal engine warnings (status codes 1-99) are not errors; they are
//! reported through [`Warning`].

use std::fmt;

use thiserror::Error;

use crate::engine::EngineError;
use crate::marshal::ScratchRole;
use crate::version::EngineVersion;

#[cfg(feature = "config")]
use crate::config::ConfigError;

/// Unified error type for all epanet-wasm operations.
///
/// # Example
///
/// ```ignore
/// use epanet_wasm::{Error, Project, Result};
///
/// fn node_count(project: &mut Project<impl EngineHandle>) -> Result<i32> {
///     match project.get_count(CountType::Node) {
///         Err(Error::NativeCall { code, .. }) if code == 102 => Ok(0),
///         other => other,
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The engine could not produce a project handle.
    #[error("Failed to create EPANET project: {0}")]
    Bootstrap(String),

    /// `EN_getversion` is missing or failed.
    #[error("Failed to determine EPANET version: {0}")]
    VersionQuery(String),

    /// The engine is older than the library supports.
    #[error(
        "EPANET version too low: loaded engine reports v{loaded}, library requires at least v{minimum}"
    )]
    VersionTooLow {
        loaded: EngineVersion,
        minimum: EngineVersion,
    },

    /// A method needs a newer engine than the one loaded.
    #[error("Method '{method}' requires EPANET v{required} or later, but loaded version is v{loaded}")]
    UnsupportedVersion {
        method: String,
        required: EngineVersion,
        loaded: EngineVersion,
    },

    /// The signature table names an entry point the engine does not export.
    #[error("EPANET function '{native}' (for method '{method}') not found in the loaded engine")]
    MissingNativeFunction { method: String, native: String },

    #[error("Method '{method}' expects {expected} argument(s), got {actual}")]
    Arity {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Array arguments to '{method}' must have equal lengths, got lengths {lengths:?}")]
    ArrayLengthMismatch { method: String, lengths: Vec<usize> },

    #[error("Method '{method}' could not allocate {size} bytes for {role}")]
    Allocation {
        method: String,
        size: usize,
        role: ScratchRole,
    },

    /// The entry point returned a status of 100 or more.
    #[error("EPANET Error {code} in '{method}': {message}")]
    NativeCall {
        method: String,
        code: i32,
        message: String,
    },

    #[error("Argument {position} of '{method}' must be {expected}, got {actual}")]
    ArgumentType {
        method: String,
        position: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// A signature table row is internally inconsistent.
    #[error("Invalid signature for '{method}': {reason}")]
    InvalidDescriptor { method: String, reason: String },

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// A call returned a shape the typed wrapper did not expect.
    #[error("Method '{method}' returned {actual}, expected {expected}")]
    UnexpectedOutput {
        method: String,
        expected: &'static str,
        actual: String,
    },

    /// Error from the engine itself (memory access, traps, signatures).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Error loading configuration.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if the engine reported an error status.
    pub fn is_native_call(&self) -> bool {
        matches!(self, Self::NativeCall { .. })
    }

    /// Returns `true` for startup and per-method version failures.
    pub fn is_version_error(&self) -> bool {
        matches!(
            self,
            Self::VersionQuery(_) | Self::VersionTooLow { .. } | Self::UnsupportedVersion { .. }
        )
    }

    /// Returns `true` if the arguments were rejected before any native call.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::Arity { .. } | Self::ArrayLengthMismatch { .. } | Self::ArgumentType { .. }
        )
    }

    /// Status code of a [`NativeCall`](Self::NativeCall) error.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            Self::NativeCall { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A non-fatal engine status (1-99). The call that produced it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub method: String,
    pub code: i32,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EPANET Warning {} in '{}': {}",
            self.code, self.method, self.message
        )
    }
}
