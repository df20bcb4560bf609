//! In-process engine whose entry points are host closures.
//!
//! [`SimulatedEngine`] implements [`EngineHandle`] on top of a
//! [`LinearMemory`] and records every native call, allocation and free.
//! It is the engine used by the test suite and is useful for exercising
//! application code without a compiled module.
//!
//! ```
//! use epanet_wasm::engine::{EngineHandle, NativeValue, Scalar, SimulatedEngine, native_arg};
//!
//! let mut engine = SimulatedEngine::new().with_function("EN_getversion", |mem, args| {
//!     let out = native_arg(args, 0, "EN_getversion")?;
//!     mem.write_scalar(out, Scalar::I32(20200))?;
//!     Ok(0)
//! });
//!
//! let slot = engine.allocate(4)?;
//! assert_eq!(engine.call("EN_getversion", &[slot.into()])?, 0);
//! assert_eq!(engine.read_scalar(slot, epanet_wasm::engine::ScalarKind::I32)?, Scalar::I32(20200));
//! # Ok::<(), epanet_wasm::engine::EngineError>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use super::{Address, EngineError, EngineHandle, LinearMemory, NativeValue};

/// A native entry point implemented on the host.
pub type NativeFn = Box<dyn FnMut(&mut LinearMemory, &[NativeValue]) -> Result<i32, EngineError>>;

/// One recorded invocation of a native entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCall {
    pub name: String,
    pub args: Vec<NativeValue>,
}

/// Fetch argument `index` of a native call as an address.
pub fn native_arg(args: &[NativeValue], index: usize, name: &str) -> Result<Address, EngineError> {
    args.get(index)
        .and_then(NativeValue::as_address)
        .ok_or_else(|| EngineError::InvalidSignature {
            name: name.to_string(),
            expected: format!("pointer argument at position {index}"),
            actual: format!("{args:?}"),
        })
}

/// Engine backed by [`LinearMemory`] and a table of host closures.
#[derive(Default)]
pub struct SimulatedEngine {
    memory: LinearMemory,
    functions: HashMap<String, NativeFn>,
    calls: Vec<NativeCall>,
    allocated: Vec<Address>,
    freed: Vec<Address>,
    allocations_left: Option<usize>,
}

impl fmt::Debug for SimulatedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("SimulatedEngine")
            .field("functions", &names)
            .field("calls", &self.calls.len())
            .field("live_allocations", &self.memory.live_allocations())
            .finish()
    }
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a memory with a custom capacity.
    pub fn with_memory(memory: LinearMemory) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    /// Register an entry point, replacing any previous one of the same name.
    pub fn with_function<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut LinearMemory, &[NativeValue]) -> Result<i32, EngineError> + 'static,
    {
        self.register(name, f);
        self
    }

    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(&mut LinearMemory, &[NativeValue]) -> Result<i32, EngineError> + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(f));
    }

    /// Remove an entry point, returning whether it existed.
    pub fn remove_function(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    /// Let the next `count` allocations succeed, then return NULL.
    pub fn fail_allocations_after(&mut self, count: usize) {
        self.allocations_left = Some(count);
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.memory
    }

    /// Every native call made so far, in order.
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.name == name).count()
    }

    /// Addresses returned by successful allocations, in order.
    pub fn allocated(&self) -> &[Address] {
        &self.allocated
    }

    /// Addresses passed to successful frees, in order.
    pub fn freed(&self) -> &[Address] {
        &self.freed
    }

    pub fn live_allocations(&self) -> usize {
        self.memory.live_allocations()
    }

    /// Forget recorded calls, allocations and frees.
    pub fn clear_history(&mut self) {
        self.calls.clear();
        self.allocated.clear();
        self.freed.clear();
    }
}

impl EngineHandle for SimulatedEngine {
    fn allocate(&mut self, size: usize) -> Result<Address, EngineError> {
        if let Some(left) = self.allocations_left.as_mut() {
            if *left == 0 {
                return Ok(Address::NULL);
            }
            *left -= 1;
        }
        let address = self.memory.allocate(size);
        if !address.is_null() {
            self.allocated.push(address);
        }
        Ok(address)
    }

    fn free(&mut self, address: Address) -> Result<(), EngineError> {
        self.memory.free(address)?;
        if !address.is_null() {
            self.freed.push(address);
        }
        Ok(())
    }

    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>, EngineError> {
        self.memory.read(address, len).map(<[u8]>::to_vec)
    }

    fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        self.memory.write(address, bytes)
    }

    fn decode_string(&self, address: Address) -> Result<String, EngineError> {
        self.memory.read_c_string(address)
    }

    fn has_function(&mut self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    fn call(&mut self, name: &str, args: &[NativeValue]) -> Result<i32, EngineError> {
        self.calls.push(NativeCall {
            name: name.to_string(),
            args: args.to_vec(),
        });
        let function = self
            .functions
            .get_mut(name)
            .ok_or_else(|| EngineError::FunctionNotFound(name.to_string()))?;
        function(&mut self.memory, args)
    }
}
