//! Engine handle backed by a core wasm module running in wasmtime.
//!
//! The module is expected to look like an emscripten build of the EPANET
//! toolkit: an exported `memory`, exported `malloc`/`free`, and one export
//! per `EN_*` entry point. Imports the host does not provide are stubbed
//! with traps so that modules needing a file-system shim still instantiate.

use std::path::Path;

use wasmtime::{Engine, Func, Instance, Linker, Memory, Module, Store, TypedFunc, Val, ValType};

use super::{Address, EngineError, EngineHandle, NativeValue};
use crate::logging::{debug, info};

/// Export names used to locate memory and the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Prefix tried when an entry point is not exported under its plain
    /// name (`EN_open` is looked up as `_EN_open` with the default `"_"`).
    pub export_prefix: String,
    pub memory_export: String,
    pub malloc_export: String,
    pub free_export: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            export_prefix: "_".to_string(),
            memory_export: "memory".to_string(),
            malloc_export: "malloc".to_string(),
            free_export: "free".to_string(),
        }
    }
}

/// A loaded EPANET module.
pub struct WasmtimeEngine {
    store: Store<()>,
    instance: Instance,
    memory: Memory,
    malloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
    options: EngineOptions,
}

impl WasmtimeEngine {
    /// Load a module from a `.wasm` (or `.wat`) file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::from_file_with_options(path, EngineOptions::default())
    }

    pub fn from_file_with_options(
        path: impl AsRef<Path>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path.as_ref())?;
        info!(path = %path.as_ref().display(), size = bytes.len(), "loading engine module");
        Self::from_bytes_with_options(&bytes, options)
    }

    /// Load a module from binary wasm or WAT text.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        Self::from_bytes_with_options(bytes, EngineOptions::default())
    }

    pub fn from_bytes_with_options(
        bytes: &[u8],
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes)?;

        let mut linker: Linker<()> = Linker::new(&engine);
        linker.define_unknown_imports_as_traps(&module)?;

        let mut store = Store::new(&engine, ());
        let instance = linker.instantiate(&mut store, &module)?;

        let memory = instance
            .get_memory(&mut store, &options.memory_export)
            .ok_or_else(|| EngineError::MissingExport(options.memory_export.clone()))?;
        let malloc = lookup_typed::<i32, i32>(&instance, &mut store, &options.malloc_export, &options.export_prefix)?;
        let free = lookup_typed::<i32, ()>(&instance, &mut store, &options.free_export, &options.export_prefix)?;

        debug!(
            memory_bytes = memory.data_size(&store),
            "engine module instantiated"
        );

        Ok(Self {
            store,
            instance,
            memory,
            malloc,
            free,
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn resolve_func(&mut self, name: &str) -> Option<Func> {
        if let Some(func) = self.instance.get_func(&mut self.store, name) {
            return Some(func);
        }
        let prefixed = format!("{}{}", self.options.export_prefix, name);
        self.instance.get_func(&mut self.store, &prefixed)
    }

    fn bounds_error(&self, address: Address, len: usize) -> EngineError {
        EngineError::OutOfBounds {
            address: address.raw(),
            len,
            memory_size: self.memory.data_size(&self.store),
        }
    }
}

fn lookup_typed<Params, Results>(
    instance: &Instance,
    store: &mut Store<()>,
    name: &str,
    prefix: &str,
) -> Result<TypedFunc<Params, Results>, EngineError>
where
    Params: wasmtime::WasmParams,
    Results: wasmtime::WasmResults,
{
    let prefixed = format!("{prefix}{name}");
    let export = if instance.get_func(&mut *store, name).is_some() {
        name
    } else if instance.get_func(&mut *store, &prefixed).is_some() {
        prefixed.as_str()
    } else {
        return Err(EngineError::MissingExport(name.to_string()));
    };
    Ok(instance.get_typed_func::<Params, Results>(&mut *store, export)?)
}

/// Convert a marshalled argument to the parameter type the export declares.
fn coerce(name: &str, position: usize, value: NativeValue, ty: &ValType) -> Result<Val, EngineError> {
    let converted = match (ty, value) {
        (ValType::I32, NativeValue::I32(v)) => Some(Val::I32(v)),
        (ValType::I32, NativeValue::I64(v)) => i32::try_from(v).ok().map(Val::I32),
        (ValType::I64, NativeValue::I32(v)) => Some(Val::I64(i64::from(v))),
        (ValType::I64, NativeValue::I64(v)) => Some(Val::I64(v)),
        (ValType::F32, v) => v.as_f64().map(|f| Val::F32((f as f32).to_bits())),
        (ValType::F64, v) => v.as_f64().map(|f| Val::F64(f.to_bits())),
        _ => None,
    };
    converted.ok_or_else(|| EngineError::InvalidSignature {
        name: name.to_string(),
        expected: format!("{ty} at position {position}"),
        actual: value.type_name().to_string(),
    })
}

impl EngineHandle for WasmtimeEngine {
    fn allocate(&mut self, size: usize) -> Result<Address, EngineError> {
        let Ok(size) = i32::try_from(size) else {
            return Ok(Address::NULL);
        };
        let raw = self
            .malloc
            .call(&mut self.store, size)
            .map_err(|e| EngineError::Trap(e.to_string()))?;
        Ok(Address::new(raw as u32))
    }

    fn free(&mut self, address: Address) -> Result<(), EngineError> {
        if address.is_null() {
            return Ok(());
        }
        self.free
            .call(&mut self.store, address.raw() as i32)
            .map_err(|e| EngineError::Trap(e.to_string()))
    }

    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>, EngineError> {
        let mut buffer = vec![0u8; len];
        self.memory
            .read(&self.store, address.raw() as usize, &mut buffer)
            .map_err(|_| self.bounds_error(address, len))?;
        Ok(buffer)
    }

    fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> Result<(), EngineError> {
        if self
            .memory
            .write(&mut self.store, address.raw() as usize, bytes)
            .is_err()
        {
            return Err(self.bounds_error(address, bytes.len()));
        }
        Ok(())
    }

    fn decode_string(&self, address: Address) -> Result<String, EngineError> {
        let data = self.memory.data(&self.store);
        let tail = data
            .get(address.raw() as usize..)
            .ok_or_else(|| self.bounds_error(address, 1))?;
        let nul = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(EngineError::UnterminatedString {
                address: address.raw(),
            })?;
        let bytes = tail.get(..nul).unwrap_or_default();
        String::from_utf8(bytes.to_vec()).map_err(|_| EngineError::InvalidUtf8 {
            address: address.raw(),
        })
    }

    fn has_function(&mut self, name: &str) -> bool {
        self.resolve_func(name).is_some()
    }

    fn call(&mut self, name: &str, args: &[NativeValue]) -> Result<i32, EngineError> {
        let func = self
            .resolve_func(name)
            .ok_or_else(|| EngineError::FunctionNotFound(name.to_string()))?;
        let ty = func.ty(&self.store);

        if ty.params().len() != args.len() {
            return Err(EngineError::InvalidSignature {
                name: name.to_string(),
                expected: format!("{} parameter(s)", ty.params().len()),
                actual: format!("{} argument(s)", args.len()),
            });
        }
        let params = ty
            .params()
            .zip(args)
            .enumerate()
            .map(|(position, (param, arg))| coerce(name, position, *arg, &param))
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = vec![Val::I32(0); ty.results().len()];
        func.call(&mut self.store, &params, &mut results)
            .map_err(|e| EngineError::Trap(e.to_string()))?;

        match results.first() {
            Some(Val::I32(code)) => Ok(*code),
            _ => Err(EngineError::InvalidSignature {
                name: name.to_string(),
                expected: "an i32 status result".to_string(),
                actual: format!("{} result(s)", results.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        (module
          (memory (export "memory") 1)
          (global $heap (mut i32) (i32.const 1024))
          (func (export "_malloc") (param $size i32) (result i32)
            (local $ptr i32)
            global.get $heap
            local.set $ptr
            global.get $heap
            local.get $size
            i32.add
            i32.const 7
            i32.add
            i32.const -8
            i32.and
            global.set $heap
            local.get $ptr)
          (func (export "_free") (param i32))
          (func (export "_EN_setoption") (param i32 i32 f64) (result i32)
            i32.const 0))
    "#;

    #[test]
    fn test_prefixed_exports_resolve() {
        let mut engine = WasmtimeEngine::from_bytes(MINIMAL.as_bytes()).unwrap();
        assert!(engine.has_function("EN_setoption"));
        assert!(!engine.has_function("EN_open"));
    }

    #[test]
    fn test_integer_arguments_coerce_to_f64() {
        let mut engine = WasmtimeEngine::from_bytes(MINIMAL.as_bytes()).unwrap();
        let args = [NativeValue::I32(1), NativeValue::I32(0), NativeValue::I32(40)];
        assert_eq!(engine.call("EN_setoption", &args).unwrap(), 0);
    }

    #[test]
    fn test_float_argument_for_integer_parameter_is_rejected() {
        let mut engine = WasmtimeEngine::from_bytes(MINIMAL.as_bytes()).unwrap();
        let args = [NativeValue::F64(1.5), NativeValue::I32(0), NativeValue::F64(40.0)];
        assert!(matches!(
            engine.call("EN_setoption", &args),
            Err(EngineError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_memory_roundtrip() {
        let mut engine = WasmtimeEngine::from_bytes(MINIMAL.as_bytes()).unwrap();
        let ptr = engine.allocate(32).unwrap();
        assert_eq!(ptr.raw(), 1024);
        engine.encode_string(ptr, "RES-1", 32).unwrap();
        assert_eq!(engine.decode_string(ptr).unwrap(), "RES-1");
        engine.free(ptr).unwrap();
    }
}
