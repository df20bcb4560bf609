//! Flat byte-addressable memory for simulated engines.

use std::collections::BTreeMap;

use super::{Address, EngineError, Scalar, ScalarKind};

/// Lowest address handed out; everything below stays unused so that a
/// successful allocation is never [`Address::NULL`].
const HEAP_BASE: usize = 8;

/// Default allocation alignment, matching emscripten's `malloc`.
const ALIGN: usize = 8;

/// Default capacity (16 MiB, the emscripten initial heap).
pub const DEFAULT_LIMIT: usize = 16 * 1024 * 1024;

/// Align a value up to the nearest multiple of alignment.
#[inline]
fn align_to(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

/// Linear memory with a bump allocator and an allocation ledger.
///
/// Every live block is tracked so that frees of unknown or already freed
/// addresses are reported instead of silently corrupting state. Freed
/// blocks are never reused, which keeps addresses unique for the lifetime
/// of the memory.
///
/// # Example
///
/// ```
/// use epanet_wasm::engine::LinearMemory;
///
/// let mut mem = LinearMemory::new();
/// let ptr = mem.allocate(4);
/// mem.write(ptr, &7i32.to_le_bytes())?;
/// assert_eq!(mem.read(ptr, 4)?, &7i32.to_le_bytes());
/// mem.free(ptr)?;
/// assert_eq!(mem.live_allocations(), 0);
/// # Ok::<(), epanet_wasm::engine::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LinearMemory {
    data: Vec<u8>,
    limit: usize,
    live: BTreeMap<u32, usize>,
}

impl Default for LinearMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearMemory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    /// Create a memory that refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            data: vec![0; HEAP_BASE],
            limit,
            live: BTreeMap::new(),
        }
    }

    /// Allocate `size` bytes, returning [`Address::NULL`] when the request
    /// is empty or would exceed the limit.
    pub fn allocate(&mut self, size: usize) -> Address {
        if size == 0 {
            return Address::NULL;
        }
        let start = align_to(self.data.len(), ALIGN);
        let end = match start.checked_add(size) {
            Some(end) if end <= self.limit => end,
            _ => return Address::NULL,
        };
        let Ok(raw) = u32::try_from(start) else {
            return Address::NULL;
        };
        self.data.resize(end, 0);
        self.live.insert(raw, size);
        Address::new(raw)
    }

    pub fn free(&mut self, address: Address) -> Result<(), EngineError> {
        if address.is_null() {
            return Ok(());
        }
        self.live
            .remove(&address.raw())
            .map(|_| ())
            .ok_or(EngineError::InvalidFree {
                address: address.raw(),
            })
    }

    /// Number of allocations not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, address: Address) -> bool {
        self.live.contains_key(&address.raw())
    }

    /// Size of the live allocation starting at `address`.
    pub fn allocation_size(&self, address: Address) -> Option<usize> {
        self.live.get(&address.raw()).copied()
    }

    pub fn read(&self, address: Address, len: usize) -> Result<&[u8], EngineError> {
        address
            .offset(len)
            .and_then(|end| self.data.get(address.raw() as usize..end.raw() as usize))
            .ok_or(EngineError::OutOfBounds {
                address: address.raw(),
                len,
                memory_size: self.data.len(),
            })
    }

    pub fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        let memory_size = self.data.len();
        address
            .offset(bytes.len())
            .and_then(|end| self.data.get_mut(address.raw() as usize..end.raw() as usize))
            .ok_or(EngineError::OutOfBounds {
                address: address.raw(),
                len: bytes.len(),
                memory_size,
            })?
            .copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_scalar(&self, address: Address, kind: ScalarKind) -> Result<Scalar, EngineError> {
        let bytes = self.read(address, kind.width())?;
        Scalar::from_le_bytes(kind, bytes).ok_or(EngineError::OutOfBounds {
            address: address.raw(),
            len: kind.width(),
            memory_size: self.data.len(),
        })
    }

    pub fn write_scalar(&mut self, address: Address, value: Scalar) -> Result<(), EngineError> {
        self.write(address, &value.to_le_bytes())
    }

    /// Bytes of the NUL-terminated string at `address`, without the terminator.
    pub fn read_c_bytes(&self, address: Address) -> Result<&[u8], EngineError> {
        let start = address.raw() as usize;
        let tail = self.data.get(start..).ok_or(EngineError::OutOfBounds {
            address: address.raw(),
            len: 1,
            memory_size: self.data.len(),
        })?;
        let nul = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(EngineError::UnterminatedString {
                address: address.raw(),
            })?;
        Ok(tail.get(..nul).unwrap_or_default())
    }

    pub fn read_c_string(&self, address: Address) -> Result<String, EngineError> {
        let bytes = self.read_c_bytes(address)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| EngineError::InvalidUtf8 {
            address: address.raw(),
        })
    }

    /// Write `text` plus a NUL terminator, ignoring any budget.
    pub fn write_c_string(&mut self, address: Address, text: &str) -> Result<(), EngineError> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        self.write(address, &bytes)
    }

    /// Read `count` consecutive little-endian doubles.
    pub fn read_f64_array(&self, address: Address, count: usize) -> Result<Vec<f64>, EngineError> {
        let width = ScalarKind::F64.width();
        let len = count.checked_mul(width).ok_or(EngineError::OutOfBounds {
            address: address.raw(),
            len: usize::MAX,
            memory_size: self.data.len(),
        })?;
        Ok(self
            .read(address, len)?
            .chunks_exact(width)
            .filter_map(|chunk| chunk.try_into().ok().map(f64::from_le_bytes))
            .collect())
    }

    /// Total size of the memory in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() <= HEAP_BASE
    }
}
