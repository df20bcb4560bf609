//! Status-code interpretation and error-message lookup.
//!
//! Every entry point returns an integer status: `0` is success, `1..=99`
//! are warnings (logged, the call carries on), and `100` and above are
//! errors that abort the call.

use crate::engine::EngineHandle;
use crate::error::{Error, Result, Warning};
use crate::logging::{debug, warn};
use crate::marshal::ScratchArena;

/// Lowest status code treated as an error.
pub const ERROR_THRESHOLD: i32 = 100;

/// Entry point used to translate status codes. Takes no project handle.
pub const GET_ERROR: &str = "EN_geterror";

/// Longest message `EN_geterror` produces (EPANET's `MAXMSG`).
const MAX_MESSAGE: usize = 255;

/// Classification of a native status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning(i32),
    Error(i32),
}

impl Status {
    pub fn classify(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1..ERROR_THRESHOLD => Self::Warning(code),
            _ => Self::Error(code),
        }
    }
}

/// Translates status codes into human-readable text.
pub trait ErrorMessages {
    fn describe(&self, engine: &mut dyn EngineHandle, code: i32) -> String;
}

/// Built-in EPANET 2.2 message catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMessages;

impl ErrorMessages for StaticMessages {
    fn describe(&self, _engine: &mut dyn EngineHandle, code: i32) -> String {
        static_message(code)
    }
}

/// Asks the engine via `EN_geterror`, falling back to [`StaticMessages`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMessages;

impl ErrorMessages for EngineMessages {
    fn describe(&self, engine: &mut dyn EngineHandle, code: i32) -> String {
        if !engine.has_function(GET_ERROR) {
            return static_message(code);
        }
        match query_message(engine, code) {
            Ok(message) if !message.is_empty() => message,
            Ok(_) => static_message(code),
            Err(e) => {
                debug!(code, error = %e, "EN_geterror failed, using built-in message");
                static_message(code)
            }
        }
    }
}

fn query_message(engine: &mut dyn EngineHandle, code: i32) -> Result<String> {
    let mut arena = ScratchArena::new(engine, GET_ERROR);
    let buffer = arena.allocate_zeroed(MAX_MESSAGE + 1)?;
    let status = arena.engine().call(
        GET_ERROR,
        &[code.into(), buffer.into(), (MAX_MESSAGE as i32).into()],
    )?;
    if status != 0 {
        return Err(Error::NativeCall {
            method: GET_ERROR.to_string(),
            code: status,
            message: format!("no message available for code {code}"),
        });
    }
    Ok(arena.engine().decode_string(buffer)?)
}

/// Message text for `code` from the built-in catalogue.
pub fn static_message(code: i32) -> String {
    let text = match code {
        1 => "WARNING: System hydraulically unbalanced.",
        2 => "WARNING: System may be hydraulically unstable.",
        3 => "WARNING: System disconnected.",
        4 => "WARNING: Pumps cannot deliver enough flow or head.",
        5 => "WARNING: Valves cannot deliver enough flow.",
        6 => "WARNING: System has negative pressures.",
        101 => "Error 101: insufficient memory available.",
        102 => "Error 102: no network data available.",
        103 => "Error 103: hydraulics not initialized.",
        104 => "Error 104: no hydraulics for water quality analysis.",
        105 => "Error 105: water quality not initialized.",
        106 => "Error 106: no results saved to report on.",
        107 => "Error 107: hydraulics supplied from external file.",
        108 => "Error 108: cannot use external file while hydraulics solver is active.",
        110 => "Error 110: cannot solve network hydraulic equations.",
        120 => "Error 120: cannot solve water quality transport equations.",
        200 => "Error 200: one or more errors detected in input file.",
        201 => "Error 201: syntax error.",
        202 => "Error 202: illegal numeric value.",
        203 => "Error 203: undefined node.",
        204 => "Error 204: undefined link.",
        205 => "Error 205: undefined time pattern.",
        206 => "Error 206: undefined curve.",
        207 => "Error 207: attempt to control a CV/GPV link.",
        209 => "Error 209: illegal node property value.",
        211 => "Error 211: illegal link property value.",
        215 => "Error 215: duplicate ID label.",
        223 => "Error 223: not enough nodes in network.",
        224 => "Error 224: no tanks or reservoirs in network.",
        240 => "Error 240: nonexistent water quality source.",
        241 => "Error 241: nonexistent control.",
        250 => "Error 250: invalid format.",
        251 => "Error 251: invalid parameter code.",
        252 => "Error 252: invalid ID name.",
        253 => "Error 253: nonexistent demand category.",
        254 => "Error 254: node with no coordinates.",
        257 => "Error 257: nonexistent rule.",
        258 => "Error 258: nonexistent rule clause.",
        259 => "Error 259: attempt to delete a node that still has links connected to it.",
        260 => "Error 260: attempt to delete node assigned as a Trace Node.",
        261 => "Error 261: attempt to delete a node or link contained in a control.",
        262 => "Error 262: attempt to modify network structure while a solver is open.",
        263 => "Error 263: node is not a tank.",
        301 => "Error 301: identical file names used for different types of files.",
        302 => "Error 302: cannot open input file.",
        303 => "Error 303: cannot open report file.",
        304 => "Error 304: cannot open binary output file.",
        305 => "Error 305: cannot open hydraulics file.",
        306 => "Error 306: hydraulics file does not match network data.",
        307 => "Error 307: cannot read hydraulics file.",
        308 => "Error 308: cannot save results to binary file.",
        309 => "Error 309: cannot save results to report file.",
        _ => return format!("Unknown EPANET status code {code}."),
    };
    text.to_string()
}

/// Interpret a status returned by `method`.
///
/// Warnings are logged and returned; errors become [`Error::NativeCall`].
/// `describe` is only invoked for non-zero codes.
pub fn check_status(
    method: &str,
    code: i32,
    describe: impl FnOnce(i32) -> String,
) -> Result<Option<Warning>> {
    match Status::classify(code) {
        Status::Success => Ok(None),
        Status::Warning(code) => {
            let message = describe(code);
            warn!(method, code, %message, "EPANET warning");
            Ok(Some(Warning {
                method: method.to_string(),
                code,
                message,
            }))
        }
        Status::Error(code) => Err(Error::NativeCall {
            method: method.to_string(),
            code,
            message: describe(code),
        }),
    }
}
