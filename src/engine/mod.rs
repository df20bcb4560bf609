//! The engine capability surface.
//!
//! Everything the marshaller needs from a loaded EPANET module is expressed
//! through the [`EngineHandle`] trait: raw allocation, scalar and byte
//! access to linear memory, string helpers, and a lookup-by-name mechanism
//! for native entry points.
//!
//! # Module Organization
//!
//! - [`error`]: Error type for engine-level failures
//! - [`memory`]: Flat byte-addressable memory with an allocation ledger
//! - [`simulated`]: In-process engine backed by host closures
//! - `wasmtime`: wasmtime-backed engine (requires `wasm` feature)

mod error;
mod memory;
mod simulated;
#[cfg(feature = "wasm")]
mod wasmtime;

use std::fmt;

pub use error::EngineError;
pub use memory::LinearMemory;
pub use simulated::{NativeCall, NativeFn, SimulatedEngine, native_arg};
#[cfg(feature = "wasm")]
pub use self::wasmtime::{EngineOptions, WasmtimeEngine};

/// An address inside the engine's linear memory.
///
/// Addresses are opaque: they can be passed to the engine and compared,
/// but not used for arithmetic outside the memory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// The null sentinel returned by a failed allocation.
    pub const NULL: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `bytes` past this one, or `None` on overflow.
    pub(crate) fn offset(self, bytes: usize) -> Option<Self> {
        let bytes = u32::try_from(bytes).ok()?;
        self.0.checked_add(bytes).map(Self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Primitive types readable from engine memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// A 32-bit address into linear memory.
    Pointer,
}

impl ScalarKind {
    /// Width of the type in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 | Self::F32 | Self::Pointer => 4,
            Self::I64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Pointer => "*",
        };
        f.write_str(name)
    }
}

/// A scalar value stored in or read from engine memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Pointer(Address),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I8(_) => ScalarKind::I8,
            Self::I16(_) => ScalarKind::I16,
            Self::I32(_) => ScalarKind::I32,
            Self::I64(_) => ScalarKind::I64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
            Self::Pointer(_) => ScalarKind::Pointer,
        }
    }

    /// Little-endian byte representation, as laid out in wasm memory.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::I8(v) => v.to_le_bytes().to_vec(),
            Self::I16(v) => v.to_le_bytes().to_vec(),
            Self::I32(v) => v.to_le_bytes().to_vec(),
            Self::I64(v) => v.to_le_bytes().to_vec(),
            Self::F32(v) => v.to_le_bytes().to_vec(),
            Self::F64(v) => v.to_le_bytes().to_vec(),
            Self::Pointer(a) => a.raw().to_le_bytes().to_vec(),
        }
    }

    /// Decode a scalar of `kind` from exactly `kind.width()` bytes.
    pub fn from_le_bytes(kind: ScalarKind, bytes: &[u8]) -> Option<Self> {
        let value = match kind {
            ScalarKind::I8 => Self::I8(i8::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::I16 => Self::I16(i16::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::I32 => Self::I32(i32::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::I64 => Self::I64(i64::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::F32 => Self::F32(f32::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::F64 => Self::F64(f64::from_le_bytes(bytes.try_into().ok()?)),
            ScalarKind::Pointer => {
                Self::Pointer(Address::new(u32::from_le_bytes(bytes.try_into().ok()?)))
            }
        };
        Some(value)
    }
}

/// A primitive argument handed to a native entry point.
///
/// Engines coerce these to the parameter types the entry point declares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    I32(i32),
    I64(i64),
    F64(f64),
}

impl NativeValue {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            Self::I64(v) => i32::try_from(*v).ok(),
            Self::F64(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            Self::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::I32(v) => Some(f64::from(*v)),
            Self::I64(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
        }
    }

    /// Interpret the value as an address (wasm32 pointers are `i32`).
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::I32(v) => Some(Address::new(*v as u32)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F64(_) => "f64",
        }
    }
}

impl From<Address> for NativeValue {
    fn from(address: Address) -> Self {
        Self::I32(address.raw() as i32)
    }
}

impl From<i32> for NativeValue {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for NativeValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for NativeValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

/// The narrow set of primitives the marshaller needs from a loaded engine.
///
/// Implementations assume exclusive access for the duration of a call;
/// `&mut self` receivers make callers serialize access.
pub trait EngineHandle {
    /// Allocate `size` bytes. Returns [`Address::NULL`] when memory is exhausted.
    fn allocate(&mut self, size: usize) -> Result<Address, EngineError>;

    /// Release an allocation. Freeing [`Address::NULL`] is a no-op.
    fn free(&mut self, address: Address) -> Result<(), EngineError>;

    /// Copy `len` bytes out of linear memory.
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>, EngineError>;

    /// Copy bytes into linear memory.
    fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> Result<(), EngineError>;

    /// Decode a NUL-terminated UTF-8 string starting at `address`.
    fn decode_string(&self, address: Address) -> Result<String, EngineError>;

    /// Whether the engine exports an entry point under `name`.
    fn has_function(&mut self, name: &str) -> bool;

    /// Invoke a native entry point and return its integer status.
    fn call(&mut self, name: &str, args: &[NativeValue]) -> Result<i32, EngineError>;

    fn read_scalar(&self, address: Address, kind: ScalarKind) -> Result<Scalar, EngineError> {
        let bytes = self.read_bytes(address, kind.width())?;
        Scalar::from_le_bytes(kind, &bytes).ok_or(EngineError::OutOfBounds {
            address: address.raw(),
            len: kind.width(),
            memory_size: bytes.len(),
        })
    }

    fn write_scalar(&mut self, address: Address, value: Scalar) -> Result<(), EngineError> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// UTF-8 byte length of `text`, excluding the terminator.
    fn string_byte_len(&self, text: &str) -> usize {
        text.len()
    }

    /// Encode `text` at `address` using at most `budget` bytes including
    /// the NUL terminator. Truncates on a character boundary and returns
    /// the number of string bytes written.
    fn encode_string(
        &mut self,
        address: Address,
        text: &str,
        budget: usize,
    ) -> Result<usize, EngineError> {
        if budget == 0 {
            return Ok(0);
        }
        let mut end = text.len().min(budget - 1);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = Vec::with_capacity(end + 1);
        bytes.extend_from_slice(text.as_bytes().get(..end).unwrap_or_default());
        bytes.push(0);
        self.write_bytes(address, &bytes)?;
        Ok(end)
    }
}
