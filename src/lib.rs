//! Table-driven bindings to the EPANET hydraulic engine compiled to WebAssembly.
//!
//! Every EPANET toolkit entry point follows the same convention: a project
//! handle first, then numbers, strings and arrays, then pointers to output
//! slots, returning an integer status. This crate describes each entry
//! point once, as a row in a signature table, and a single marshaller turns
//! every row into a callable method. The marshaller copies strings and
//! arrays into engine memory, allocates output slots, interprets the
//! status code and frees everything it allocated on every exit path.
//!
//! # Quick Start
//!
//! ```ignore
//! use epanet_wasm::prelude::*;
//!
//! let engine = WasmtimeEngine::from_file("epanet.wasm")?;
//! let mut project = Project::new(engine)?;
//! project.init("", "", FlowUnits::Gpm, HeadLossType::HazenWilliams)?;
//! project.add_node("J1", NodeType::Junction)?;
//! assert_eq!(project.get_node_index("J1")?, 1);
//!
//! // Or by name, as listed in the signature table
//! let index = project.call("getNodeIndex", &["J1".into()])?.into_int("getNodeIndex")?;
//! ```
//!
//! # Modules
//!
//! - [`engine`] - The engine capability surface and its implementations
//! - [`signature`] - Declarative method descriptors and the signature table
//! - [`marshal`] - The method factory and per-call scratch memory
//! - [`project`] - The public facade and typed wrappers
//! - [`version`] - Engine version parsing and gating
//! - [`status`] - Status-code classification and messages
//! - [`config`] - TOML session configuration (requires `config` feature)
//!
//! # Feature Flags
//!
//! - `wasm` - Enable the wasmtime-backed engine (enabled by default)
//! - `config` - Enable TOML configuration
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line interface binary
//! - `full` - Enable all features

pub mod engine;
mod logging;
pub mod marshal;
pub mod prelude;
pub mod project;
pub mod signature;
pub mod status;
pub mod version;

#[cfg(feature = "config")]
pub mod config;
#[cfg(feature = "cli")]
pub mod subscriber;

mod error;

// Re-export the unified error type
pub use error::{Error, Result, Warning};

pub use engine::{Address, EngineError, EngineHandle, SimulatedEngine};
#[cfg(feature = "wasm")]
pub use engine::{EngineOptions, WasmtimeEngine};
pub use marshal::{Arg, CallOutput, Value};
pub use project::{Project, ProjectHandle};
pub use signature::{MethodDescriptor, SIGNATURE_TABLE};
pub use version::{EngineVersion, MINIMUM_SUPPORTED};
