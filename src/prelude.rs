//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use epanet_wasm::prelude::*;
//!
//! let mut project = Project::new(WasmtimeEngine::from_file("epanet.wasm")?)?;
//! let units = project.get_flow_units()?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result, Warning};

// Engine types
pub use crate::engine::{Address, EngineError, EngineHandle, SimulatedEngine};
#[cfg(feature = "wasm")]
pub use crate::engine::{EngineOptions, WasmtimeEngine};

// Facade and call values
pub use crate::marshal::{Arg, CallOutput, Value};
pub use crate::project::types::*;
pub use crate::project::{Project, ProjectHandle};
pub use crate::version::EngineVersion;
