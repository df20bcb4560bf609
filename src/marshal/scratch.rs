//! Scoped scratch allocations for a single call.

use std::fmt;

use crate::engine::{Address, EngineHandle, ScalarKind};
use crate::error::{Error, Result};
use crate::logging::{error, trace};
use crate::signature::OutputKind;

use super::Value;

/// Why a scratch block was allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchRole {
    InputString,
    InputArray,
    OutputSlot,
}

impl ScratchRole {
    fn is_input(self) -> bool {
        matches!(self, Self::InputString | Self::InputArray)
    }
}

impl fmt::Display for ScratchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InputString => "an input string",
            Self::InputArray => "an input array",
            Self::OutputSlot => "an output slot",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy)]
struct Scratch {
    address: Address,
    role: ScratchRole,
}

/// Owner of every scratch allocation made during one call.
///
/// Allocations are recorded as soon as the engine hands them out. Inputs
/// are released explicitly after the native call, output slots are
/// released as they are decoded, and whatever is still live when the arena
/// drops is freed then, so an early return never leaks engine memory.
pub struct ScratchArena<'a> {
    engine: &'a mut dyn EngineHandle,
    method: &'a str,
    live: Vec<Scratch>,
}

impl<'a> ScratchArena<'a> {
    pub fn new(engine: &'a mut dyn EngineHandle, method: &'a str) -> Self {
        Self {
            engine,
            method,
            live: Vec::new(),
        }
    }

    /// The engine, for native calls made while allocations are held.
    pub fn engine(&mut self) -> &mut dyn EngineHandle {
        &mut *self.engine
    }

    /// Number of allocations not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Allocate `size` bytes, failing on the NULL sentinel.
    pub fn allocate(&mut self, size: usize, role: ScratchRole) -> Result<Address> {
        let address = self.engine.allocate(size)?;
        if address.is_null() {
            return Err(Error::Allocation {
                method: self.method.to_string(),
                size,
                role,
            });
        }
        trace!(method = self.method, %address, size, %role, "scratch allocated");
        self.live.push(Scratch { address, role });
        Ok(address)
    }

    /// Allocate `size` zero-filled bytes for the engine to write into.
    pub fn allocate_zeroed(&mut self, size: usize) -> Result<Address> {
        let address = self.allocate(size, ScratchRole::OutputSlot)?;
        self.engine.write_bytes(address, &vec![0; size])?;
        Ok(address)
    }

    /// Allocate and zero an output slot sized for `kind`.
    ///
    /// Zeroing keeps 64-bit reads well defined when the engine only
    /// writes the low word (wasm32 `long` is 4 bytes).
    pub fn allocate_output(&mut self, kind: OutputKind) -> Result<Address> {
        self.allocate_zeroed(kind.size())
    }

    /// Copy `text` into a NUL-terminated scratch buffer.
    pub fn allocate_string(&mut self, text: &str) -> Result<Address> {
        let budget = self.engine.string_byte_len(text) + 1;
        let address = self.allocate(budget, ScratchRole::InputString)?;
        self.engine.encode_string(address, text, budget)?;
        Ok(address)
    }

    /// Copy `values` into a contiguous block of little-endian doubles.
    ///
    /// An empty array is passed as NULL without allocating.
    pub fn allocate_numbers(&mut self, values: &[f64]) -> Result<Address> {
        if values.is_empty() {
            return Ok(Address::NULL);
        }
        let width = ScalarKind::F64.width();
        let address = self.allocate(values.len() * width, ScratchRole::InputArray)?;
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.engine.write_bytes(address, &bytes)?;
        Ok(address)
    }

    /// Release every input-side allocation.
    pub fn release_inputs(&mut self) {
        let (inputs, rest): (Vec<_>, Vec<_>) =
            self.live.drain(..).partition(|s| s.role.is_input());
        self.live = rest;
        for scratch in inputs {
            self.release(scratch);
        }
    }

    /// Decode an output slot, then release it.
    ///
    /// The slot is released even when decoding fails.
    pub fn decode_output(&mut self, address: Address, kind: OutputKind) -> Result<Value> {
        let decoded = decode(&*self.engine, address, kind);
        if let Some(position) = self.live.iter().position(|s| s.address == address) {
            let scratch = self.live.remove(position);
            self.release(scratch);
        }
        decoded
    }

    fn release(&mut self, scratch: Scratch) {
        match self.engine.free(scratch.address) {
            Ok(()) => {
                trace!(method = self.method, address = %scratch.address, "scratch released");
            }
            Err(e) => {
                error!(
                    method = self.method,
                    address = %scratch.address,
                    role = %scratch.role,
                    error = %e,
                    "failed to release scratch memory"
                );
            }
        }
    }
}

impl Drop for ScratchArena<'_> {
    fn drop(&mut self) {
        if self.live.is_empty() {
            return;
        }
        trace!(method = self.method, count = self.live.len(), "releasing scratch on exit");
        for scratch in std::mem::take(&mut self.live) {
            self.release(scratch);
        }
    }
}

fn decode(engine: &dyn EngineHandle, address: Address, kind: OutputKind) -> Result<Value> {
    let value = match kind {
        OutputKind::Int => engine.read_scalar(address, ScalarKind::I32)?,
        OutputKind::Long => engine.read_scalar(address, ScalarKind::I64)?,
        OutputKind::Double => engine.read_scalar(address, ScalarKind::F64)?,
        OutputKind::Id | OutputKind::Title => {
            return Ok(Value::Text(engine.decode_string(address)?));
        }
    };
    Ok(match value {
        crate::engine::Scalar::I32(v) => Value::Int(v),
        crate::engine::Scalar::I64(v) => Value::Long(v),
        crate::engine::Scalar::F64(v) => Value::Double(v),
        other => {
            return Err(Error::UnexpectedOutput {
                method: String::from("scratch decode"),
                expected: "an int, long or double",
                actual: format!("{other:?}"),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, SimulatedEngine};

    #[test]
    fn test_drop_releases_everything() {
        let mut engine = SimulatedEngine::new();
        {
            let mut arena = ScratchArena::new(&mut engine, "test");
            arena.allocate_string("J1").unwrap();
            arena.allocate_numbers(&[1.0, 2.0]).unwrap();
            arena.allocate_output(OutputKind::Double).unwrap();
            assert_eq!(arena.live_count(), 3);
        }
        assert_eq!(engine.live_allocations(), 0);
        assert_eq!(engine.freed().len(), 3);
    }

    #[test]
    fn test_release_inputs_keeps_outputs() {
        let mut engine = SimulatedEngine::new();
        let mut arena = ScratchArena::new(&mut engine, "test");
        arena.allocate_string("tank").unwrap();
        let slot = arena.allocate_output(OutputKind::Int).unwrap();
        arena.release_inputs();
        assert_eq!(arena.live_count(), 1);
        assert_eq!(arena.decode_output(slot, OutputKind::Int).unwrap(), Value::Int(0));
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_failed_decode_still_releases_slot() {
        let mut engine = SimulatedEngine::new();
        let mut arena = ScratchArena::new(&mut engine, "test");
        let slot = arena.allocate_output(OutputKind::Id).unwrap();
        arena.engine().write_bytes(slot, &[0xff, 0xfe, 0]).unwrap();
        let err = arena.decode_output(slot, OutputKind::Id).unwrap_err();
        assert!(matches!(err, Error::Engine(EngineError::InvalidUtf8 { .. })));
        assert_eq!(arena.live_count(), 0);
        drop(arena);
        assert_eq!(engine.live_allocations(), 0);
    }

    #[test]
    fn test_null_allocation_is_an_error() {
        let mut engine = SimulatedEngine::new();
        engine.fail_allocations_after(0);
        let mut arena = ScratchArena::new(&mut engine, "getNodeIndex");
        let err = arena.allocate_output(OutputKind::Int).unwrap_err();
        assert!(matches!(
            err,
            Error::Allocation { size: 4, role: ScratchRole::OutputSlot, .. }
        ));
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_numbers_layout() {
        let mut engine = SimulatedEngine::new();
        let mut arena = ScratchArena::new(&mut engine, "setPattern");
        let ptr = arena.allocate_numbers(&[0.5, 1.5, 2.5]).unwrap();
        assert!(arena.allocate_numbers(&[]).unwrap().is_null());
        drop(arena);
        // Contents survive in memory after release; only the ledger changes.
        assert_eq!(
            engine.memory().read_f64_array(ptr, 3).unwrap(),
            vec![0.5, 1.5, 2.5]
        );
    }
}
