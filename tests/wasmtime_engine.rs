//! End-to-end tests against a real wasm module running in wasmtime.
//!
//! The module is a hand-written stand-in for an emscripten build of the
//! toolkit: exported memory, a bump `malloc`, a no-op `free`, and a few
//! `EN_*` entry points with the same signatures as the real ones.

#![cfg(feature = "wasm")]

use epanet_wasm::engine::{EngineHandle, WasmtimeEngine};
use epanet_wasm::prelude::*;
use epanet_wasm::status::StaticMessages;

const FAKE_EPANET: &str = r#"
(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 4096))
  (data (i32.const 64) "wasm error text\00")

  (func (export "malloc") (param $size i32) (result i32)
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
  (func (export "free") (param i32))

  (func (export "EN_getversion") (param $out i32) (result i32)
    local.get $out
    i32.const 20200
    i32.store
    i32.const 0)

  (func (export "EN_createproject") (param $out i32) (result i32)
    local.get $out
    i32.const 1000
    i32.store
    i32.const 0)

  (func (export "EN_deleteproject") (param i32) (result i32)
    i32.const 0)

  (func (export "EN_geterror") (param $code i32) (param $buf i32) (param $max i32) (result i32)
    local.get $buf
    i32.const 64
    i32.const 16
    memory.copy
    i32.const 0)

  ;; Exported with the emscripten underscore to exercise prefix lookup.
  (func (export "_EN_getcount") (param $ph i32) (param $kind i32) (param $out i32) (result i32)
    local.get $out
    local.get $kind
    i32.const 10
    i32.add
    i32.store
    i32.const 0)

  ;; Index is the byte length of the ID, to prove the string arrived.
  (func (export "EN_getnodeindex") (param $ph i32) (param $id i32) (param $out i32) (result i32)
    (local $len i32)
    block $done
      loop $scan
        local.get $id
        local.get $len
        i32.add
        i32.load8_u
        i32.eqz
        br_if $done
        local.get $len
        i32.const 1
        i32.add
        local.set $len
        br $scan
      end
    end
    local.get $out
    local.get $len
    i32.store
    i32.const 0)

  (func (export "EN_getnodevalue") (param $ph i32) (param $index i32) (param $prop i32) (param $out i32) (result i32)
    local.get $out
    f64.const 12.5
    f64.store
    i32.const 0)

  (func (export "EN_setnodevalue") (param $ph i32) (param $index i32) (param $prop i32) (param $value f64) (result i32)
    local.get $value
    f64.const 0
    f64.lt
    if (result i32)
      i32.const 209
    else
      i32.const 0
    end)

  (func (export "EN_close") (param i32) (result i32)
    i32.const 103))
"#;

fn project() -> Result<Project<WasmtimeEngine>> {
    let engine = WasmtimeEngine::from_bytes(FAKE_EPANET.as_bytes())?;
    Project::new(engine)
}

#[test]
fn test_session_bootstraps() -> Result<()> {
    let project = project()?;
    assert_eq!(project.version(), EngineVersion::new(2, 2, 0));
    assert_eq!(project.handle(), ProjectHandle::new(1000));
    Ok(())
}

#[test]
fn test_scalar_and_string_calls() -> Result<()> {
    let mut project = project()?;
    assert_eq!(project.get_count(CountType::Link)?, 12);
    assert_eq!(project.get_node_index("PUMP-7")?, 6);
    assert_eq!(project.get_node_value(1, NodeProperty::Pressure)?, 12.5);
    project.set_node_value(1, NodeProperty::Elevation, 30.0)?;
    Ok(())
}

#[test]
fn test_error_status_uses_engine_message() -> Result<()> {
    let mut project = project()?;
    let err = project.close().unwrap_err();
    assert!(matches!(
        err,
        Error::NativeCall { code: 103, ref message, .. } if message == "wasm error text"
    ));

    let err = project
        .set_node_value(1, NodeProperty::Elevation, -1.0)
        .unwrap_err();
    assert_eq!(err.status_code(), Some(209));
    Ok(())
}

#[test]
fn test_static_messages_skip_the_engine() -> Result<()> {
    let engine = WasmtimeEngine::from_bytes(FAKE_EPANET.as_bytes())?;
    let mut project = Project::with_messages(engine, Box::new(StaticMessages))?;
    let err = project.close().unwrap_err();
    assert!(err.to_string().contains("hydraulics not initialized"));
    Ok(())
}

#[test]
fn test_missing_exports_surface_at_call_time() -> Result<()> {
    let mut project = project()?;
    assert!(!project.engine_mut().has_function("EN_addnode"));
    assert!(matches!(
        project.add_node("J1", NodeType::Junction),
        Err(Error::MissingNativeFunction { .. })
    ));
    Ok(())
}

fn project_from_disk(dir: &tempfile::TempDir) -> anyhow::Result<Project<WasmtimeEngine>> {
    let path = dir.path().join("epanet.wat");
    std::fs::write(&path, FAKE_EPANET)?;
    let engine = WasmtimeEngine::from_file(&path)?;
    Ok(Project::new(engine)?)
}

#[test]
fn test_module_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut project = project_from_disk(&dir)?;
    let nodes = project.get_count(CountType::Node)?;
    if nodes != 10 {
        return Err(anyhow::anyhow!("expected 10 from the fake getcount, got {nodes}"));
    }
    Ok(())
}

#[test]
fn test_module_without_allocator_is_rejected() {
    let wat = r#"(module (memory (export "memory") 1))"#;
    assert!(WasmtimeEngine::from_bytes(wat.as_bytes()).is_err());
}
