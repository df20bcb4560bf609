//! Common test utilities and fixtures.
//!
//! [`fake_epanet`] builds a [`SimulatedEngine`] exposing a small in-memory
//! imitation of the EPANET toolkit: nodes, patterns, curves, titles and a
//! hydraulic clock. It keeps just enough state for the facade tests to
//! observe real round trips through engine memory.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use epanet_wasm::engine::{
    Address, EngineError, LinearMemory, NativeValue, Scalar, SimulatedEngine, native_arg,
};

// =============================================================================
// Constants
// =============================================================================

/// Raw handle value the fake engine hands out.
pub const HANDLE: i32 = 0x4242;

/// The oldest supported release, encoded.
pub const V2_2: i32 = 20200;

/// A release with the newer entry points.
pub const V2_3: i32 = 20300;

// =============================================================================
// Fake network state
// =============================================================================

#[derive(Debug, Default, Clone)]
pub struct Node {
    pub id: String,
    pub kind: i32,
    pub x: f64,
    pub y: f64,
    pub values: Vec<(i32, f64)>,
}

#[derive(Debug, Default, Clone)]
pub struct Curve {
    pub id: String,
    pub kind: i32,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Default, Clone)]
pub struct Pattern {
    pub id: String,
    pub values: Vec<f64>,
}

/// Observable state shared between the test and the fake entry points.
#[derive(Debug, Default)]
pub struct FakeState {
    pub nodes: Vec<Node>,
    pub curves: Vec<Curve>,
    pub patterns: Vec<Pattern>,
    pub title: [String; 3],
    pub clock: i32,
    pub deleted_projects: Vec<i32>,
    /// Status returned by `EN_solveH`.
    pub solve_status: i32,
}

pub type Shared = Rc<RefCell<FakeState>>;

// =============================================================================
// Argument helpers
// =============================================================================

pub fn int_arg(args: &[NativeValue], index: usize, name: &str) -> Result<i32, EngineError> {
    args.get(index)
        .and_then(NativeValue::as_i32)
        .ok_or_else(|| EngineError::InvalidSignature {
            name: name.to_string(),
            expected: format!("int argument at position {index}"),
            actual: format!("{args:?}"),
        })
}

pub fn f64_arg(args: &[NativeValue], index: usize, name: &str) -> Result<f64, EngineError> {
    args.get(index)
        .and_then(NativeValue::as_f64)
        .ok_or_else(|| EngineError::InvalidSignature {
            name: name.to_string(),
            expected: format!("double argument at position {index}"),
            actual: format!("{args:?}"),
        })
}

fn write_int(mem: &mut LinearMemory, address: Address, value: i32) -> Result<(), EngineError> {
    mem.write_scalar(address, Scalar::I32(value))
}

fn write_double(mem: &mut LinearMemory, address: Address, value: f64) -> Result<(), EngineError> {
    mem.write_scalar(address, Scalar::F64(value))
}

/// 1-based lookup, returning EPANET's "undefined object" code on a miss.
fn slot<T>(items: &mut [T], index: i32, missing: i32) -> Result<&mut T, i32> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| items.get_mut(i))
        .ok_or(missing)
}

macro_rules! status {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(code) => return Ok(code),
        }
    };
}

// =============================================================================
// Engine builders
// =============================================================================

/// An engine with only project creation, deletion and the version query.
pub fn bootstrap_engine(version: i32) -> (SimulatedEngine, Shared) {
    let state: Shared = Rc::default();
    let mut engine = SimulatedEngine::new();

    engine.register("EN_createproject", |mem, args| {
        write_int(mem, native_arg(args, 0, "EN_createproject")?, HANDLE)?;
        Ok(0)
    });
    let s = state.clone();
    engine.register("EN_deleteproject", move |_, args| {
        s.borrow_mut()
            .deleted_projects
            .push(int_arg(args, 0, "EN_deleteproject")?);
        Ok(0)
    });
    engine.register("EN_getversion", move |mem, args| {
        write_int(mem, native_arg(args, 0, "EN_getversion")?, version)?;
        Ok(0)
    });
    engine.register("EN_geterror", |mem, args| {
        let code = int_arg(args, 0, "EN_geterror")?;
        mem.write_c_string(native_arg(args, 1, "EN_geterror")?, &format!("fake error {code}"))?;
        Ok(0)
    });

    (engine, state)
}

/// A fake EPANET engine reporting `version`.
pub fn fake_epanet(version: i32) -> (SimulatedEngine, Shared) {
    let (mut engine, state) = bootstrap_engine(version);

    for name in ["EN_init", "EN_close", "EN_openH", "EN_initH", "EN_closeH"] {
        engine.register(name, |_, _| Ok(0));
    }

    let s = state.clone();
    engine.register("EN_solveH", move |_, _| Ok(s.borrow().solve_status));

    let s = state.clone();
    engine.register("EN_runH", move |mem, args| {
        // wasm32 `long` is 4 bytes; the host reads 8 from a zeroed slot.
        write_int(mem, native_arg(args, 1, "EN_runH")?, s.borrow().clock)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_nextH", move |mem, args| {
        let mut state = s.borrow_mut();
        let step = if state.clock < 7200 { 3600 } else { 0 };
        state.clock += step;
        write_int(mem, native_arg(args, 1, "EN_nextH")?, step)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_gettitle", move |mem, args| {
        let state = s.borrow();
        for (i, line) in state.title.iter().enumerate() {
            mem.write_c_string(native_arg(args, i + 1, "EN_gettitle")?, line)?;
        }
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_settitle", move |mem, args| {
        let mut state = s.borrow_mut();
        for i in 0..3 {
            let line = mem.read_c_string(native_arg(args, i + 1, "EN_settitle")?)?;
            if let Some(slot) = state.title.get_mut(i) {
                *slot = line;
            }
        }
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getcount", move |mem, args| {
        let state = s.borrow();
        let count = match int_arg(args, 1, "EN_getcount")? {
            0 => state.nodes.len(),
            1 => state.nodes.iter().filter(|n| n.kind != 0).count(),
            3 => state.patterns.len(),
            4 => state.curves.len(),
            2 | 5 | 6 => 0,
            _ => return Ok(251),
        };
        write_int(mem, native_arg(args, 2, "EN_getcount")?, count as i32)?;
        Ok(0)
    });

    register_nodes(&mut engine, &state);
    register_patterns(&mut engine, &state);
    register_curves(&mut engine, &state);

    (engine, state)
}

fn register_nodes(engine: &mut SimulatedEngine, state: &Shared) {
    let s = state.clone();
    engine.register("EN_addnode", move |mem, args| {
        let id = mem.read_c_string(native_arg(args, 1, "EN_addnode")?)?;
        let kind = int_arg(args, 2, "EN_addnode")?;
        let mut state = s.borrow_mut();
        if state.nodes.iter().any(|n| n.id == id) {
            return Ok(215);
        }
        state.nodes.push(Node {
            id,
            kind,
            ..Node::default()
        });
        let index = state.nodes.len() as i32;
        write_int(mem, native_arg(args, 3, "EN_addnode")?, index)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getnodeindex", move |mem, args| {
        let id = mem.read_c_string(native_arg(args, 1, "EN_getnodeindex")?)?;
        let state = s.borrow();
        let position = status!(state.nodes.iter().position(|n| n.id == id).ok_or(203));
        write_int(mem, native_arg(args, 2, "EN_getnodeindex")?, position as i32 + 1)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getnodeid", move |mem, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_getnodeid")?, 203));
        mem.write_c_string(native_arg(args, 2, "EN_getnodeid")?, &node.id)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getnodetype", move |mem, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_getnodetype")?, 203));
        write_int(mem, native_arg(args, 2, "EN_getnodetype")?, node.kind)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_setcoord", move |_, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_setcoord")?, 203));
        node.x = f64_arg(args, 2, "EN_setcoord")?;
        node.y = f64_arg(args, 3, "EN_setcoord")?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getcoord", move |mem, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_getcoord")?, 203));
        write_double(mem, native_arg(args, 2, "EN_getcoord")?, node.x)?;
        write_double(mem, native_arg(args, 3, "EN_getcoord")?, node.y)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_setnodevalue", move |_, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_setnodevalue")?, 203));
        let property = int_arg(args, 2, "EN_setnodevalue")?;
        let value = f64_arg(args, 3, "EN_setnodevalue")?;
        node.values.retain(|(p, _)| *p != property);
        node.values.push((property, value));
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getnodevalue", move |mem, args| {
        let mut state = s.borrow_mut();
        let node = status!(slot(&mut state.nodes, int_arg(args, 1, "EN_getnodevalue")?, 203));
        let property = int_arg(args, 2, "EN_getnodevalue")?;
        let value = status!(
            node.values
                .iter()
                .find(|(p, _)| *p == property)
                .map(|(_, v)| *v)
                .ok_or(251)
        );
        write_double(mem, native_arg(args, 3, "EN_getnodevalue")?, value)?;
        Ok(0)
    });
}

fn register_patterns(engine: &mut SimulatedEngine, state: &Shared) {
    let s = state.clone();
    engine.register("EN_addpattern", move |mem, args| {
        let id = mem.read_c_string(native_arg(args, 1, "EN_addpattern")?)?;
        s.borrow_mut().patterns.push(Pattern {
            id,
            values: vec![1.0],
        });
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_setpattern", move |mem, args| {
        let index = int_arg(args, 1, "EN_setpattern")?;
        let count = int_arg(args, 3, "EN_setpattern")?;
        if count <= 0 {
            return Ok(202);
        }
        let values = mem.read_f64_array(native_arg(args, 2, "EN_setpattern")?, count as usize)?;
        let mut state = s.borrow_mut();
        let pattern = status!(slot(&mut state.patterns, index, 205));
        pattern.values = values;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getpatternlen", move |mem, args| {
        let mut state = s.borrow_mut();
        let pattern = status!(slot(&mut state.patterns, int_arg(args, 1, "EN_getpatternlen")?, 205));
        write_int(mem, native_arg(args, 2, "EN_getpatternlen")?, pattern.values.len() as i32)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getpatternvalue", move |mem, args| {
        let mut state = s.borrow_mut();
        let pattern = status!(slot(&mut state.patterns, int_arg(args, 1, "EN_getpatternvalue")?, 205));
        let period = int_arg(args, 2, "EN_getpatternvalue")?;
        let value = *status!(slot(&mut pattern.values, period, 251));
        write_double(mem, native_arg(args, 3, "EN_getpatternvalue")?, value)?;
        Ok(0)
    });
}

fn register_curves(engine: &mut SimulatedEngine, state: &Shared) {
    let s = state.clone();
    engine.register("EN_addcurve", move |mem, args| {
        let id = mem.read_c_string(native_arg(args, 1, "EN_addcurve")?)?;
        s.borrow_mut().curves.push(Curve {
            id,
            kind: 4,
            points: vec![(1.0, 1.0)],
        });
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getcurveid", move |mem, args| {
        let mut state = s.borrow_mut();
        let curve = status!(slot(&mut state.curves, int_arg(args, 1, "EN_getcurveid")?, 206));
        mem.write_c_string(native_arg(args, 2, "EN_getcurveid")?, &curve.id)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_setcurve", move |mem, args| {
        let index = int_arg(args, 1, "EN_setcurve")?;
        let count = int_arg(args, 4, "EN_setcurve")?;
        if count <= 0 {
            return Ok(202);
        }
        let xs = mem.read_f64_array(native_arg(args, 2, "EN_setcurve")?, count as usize)?;
        let ys = mem.read_f64_array(native_arg(args, 3, "EN_setcurve")?, count as usize)?;
        let mut state = s.borrow_mut();
        let curve = status!(slot(&mut state.curves, index, 206));
        curve.points = xs.into_iter().zip(ys).collect();
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getcurvelen", move |mem, args| {
        let mut state = s.borrow_mut();
        let curve = status!(slot(&mut state.curves, int_arg(args, 1, "EN_getcurvelen")?, 206));
        write_int(mem, native_arg(args, 2, "EN_getcurvelen")?, curve.points.len() as i32)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_getcurvevalue", move |mem, args| {
        let mut state = s.borrow_mut();
        let curve = status!(slot(&mut state.curves, int_arg(args, 1, "EN_getcurvevalue")?, 206));
        let (x, y) = *status!(slot(&mut curve.points, int_arg(args, 2, "EN_getcurvevalue")?, 251));
        write_double(mem, native_arg(args, 3, "EN_getcurvevalue")?, x)?;
        write_double(mem, native_arg(args, 4, "EN_getcurvevalue")?, y)?;
        Ok(0)
    });

    let s = state.clone();
    engine.register("EN_setcurvetype", move |_, args| {
        let mut state = s.borrow_mut();
        let curve = status!(slot(&mut state.curves, int_arg(args, 1, "EN_setcurvetype")?, 206));
        curve.kind = int_arg(args, 2, "EN_setcurvetype")?;
        Ok(0)
    });
}
