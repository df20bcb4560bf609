//! Error types for engine-level operations.

use thiserror::Error;

/// Errors raised by an [`EngineHandle`](super::EngineHandle) implementation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to read the module file.
    #[error("Failed to load engine module: {0}")]
    ModuleLoad(#[from] std::io::Error),

    /// Wasmtime compilation, instantiation or linking error.
    #[cfg(feature = "wasm")]
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),

    /// A required export (memory, allocator) is missing from the module.
    #[error("Module does not export '{0}'")]
    MissingExport(String),

    /// Entry point not exported by the engine.
    #[error("Function not found in engine: {0}")]
    FunctionNotFound(String),

    /// Argument list does not match the entry point's parameters.
    #[error("Invalid call to '{name}': expected {expected}, got {actual}")]
    InvalidSignature {
        name: String,
        expected: String,
        actual: String,
    },

    /// Engine execution trapped.
    #[error("Engine execution trapped: {0}")]
    Trap(String),

    #[error("Memory access at {address:#x} with length {len} exceeds memory size {memory_size}")]
    OutOfBounds {
        address: u32,
        len: usize,
        memory_size: usize,
    },

    #[error("String at {address:#x} is not terminated inside linear memory")]
    UnterminatedString { address: u32 },

    #[error("String at {address:#x} is not valid UTF-8")]
    InvalidUtf8 { address: u32 },

    /// Freed an address that is not a live allocation.
    #[error("Invalid free of {address:#x}: not a live allocation")]
    InvalidFree { address: u32 },
}
