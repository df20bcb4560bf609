//! Turning signature rows into callable methods.
//!
//! [`MethodFactory`] builds one [`MethodFn`] per row of the signature
//! table. Each call runs the same pipeline:
//!
//! 1. check the user arity and that all array arguments agree in length
//! 2. apply the per-method version gate
//! 3. fail if the engine does not export the entry point
//! 4. marshal strings and arrays into scratch memory, derive lengths
//! 5. allocate zero-filled output slots
//! 6. call the entry point with the project handle first
//! 7. release inputs and interpret the status code
//! 8. decode and release each output slot, then shape the result
//!
//! Scratch memory is owned by a [`ScratchArena`], so every exit path,
//! including errors and traps, releases what was allocated exactly once.

mod scratch;
mod value;

use std::collections::HashMap;

use crate::engine::{EngineHandle, NativeValue};
use crate::error::{Error, Result, Warning};
use crate::logging::{debug, trace};
use crate::project::ProjectHandle;
use crate::signature::{ArgSpec, MethodDescriptor};
use crate::status::{ErrorMessages, check_status};
use crate::version::{EngineVersion, ensure_supported};

pub use scratch::{ScratchArena, ScratchRole};
pub use value::{Arg, CallOutput, Value};

/// Everything a method needs for one invocation.
pub struct CallContext<'a> {
    pub engine: &'a mut dyn EngineHandle,
    pub project: ProjectHandle,
    pub version: EngineVersion,
    pub messages: &'a dyn ErrorMessages,
    /// Warnings raised by the call are appended here.
    pub warnings: &'a mut Vec<Warning>,
}

/// A bound, ready-to-call facade method.
pub type MethodFn = Box<dyn Fn(&mut CallContext<'_>, &[Arg]) -> Result<CallOutput> + Send + Sync>;

/// Public method name to bound method.
pub type MethodTable = HashMap<&'static str, MethodFn>;

/// Builds [`MethodFn`]s from signature rows.
pub struct MethodFactory;

impl MethodFactory {
    /// Bind one row against `engine`.
    ///
    /// Binding never fails. A row whose entry point is missing still
    /// produces a method; calling it reports
    /// [`Error::MissingNativeFunction`] once the argument and version
    /// checks have passed.
    pub fn build(
        name: &'static str,
        descriptor: &'static MethodDescriptor,
        engine: &mut dyn EngineHandle,
    ) -> MethodFn {
        let available = engine.has_function(descriptor.native_name);
        if !available {
            debug!(method = name, native = descriptor.native_name, "entry point not exported");
        }
        let validity = descriptor.validate();

        Box::new(move |ctx, args| {
            invoke(ctx, name, descriptor, available, validity.as_ref().err(), args)
        })
    }

    /// Bind every row of `table`.
    pub fn build_all(
        table: &'static [(&'static str, MethodDescriptor)],
        engine: &mut dyn EngineHandle,
    ) -> MethodTable {
        let methods: MethodTable = table
            .iter()
            .map(|(name, descriptor)| (*name, Self::build(name, descriptor, engine)))
            .collect();
        debug!(count = methods.len(), "bound facade methods");
        methods
    }
}

fn invoke(
    ctx: &mut CallContext<'_>,
    name: &'static str,
    descriptor: &MethodDescriptor,
    available: bool,
    invalid: Option<&String>,
    args: &[Arg],
) -> Result<CallOutput> {
    let expected = descriptor.user_arity();
    if args.len() != expected {
        return Err(Error::Arity {
            method: name.to_string(),
            expected,
            actual: args.len(),
        });
    }
    check_array_lengths(name, descriptor, args)?;

    if let Some(required) = descriptor.min_version {
        ensure_supported(name, required, ctx.version)?;
    }
    if !available {
        return Err(Error::MissingNativeFunction {
            method: name.to_string(),
            native: descriptor.native_name.to_string(),
        });
    }
    if let Some(reason) = invalid {
        return Err(Error::InvalidDescriptor {
            method: name.to_string(),
            reason: reason.clone(),
        });
    }

    debug!(method = name, native = descriptor.native_name, "calling entry point");

    let mut arena = ScratchArena::new(&mut *ctx.engine, name);
    let mut native_args = Vec::with_capacity(1 + descriptor.inputs.len() + descriptor.outputs.len());
    native_args.push(NativeValue::from(ctx.project));

    let mut user_args = args.iter().enumerate();
    for spec in descriptor.inputs {
        let value = match spec {
            ArgSpec::LengthOf(key) => derived_length(name, descriptor, key, args)?,
            _ => {
                let (index, arg) = user_args.next().ok_or_else(|| Error::Arity {
                    method: name.to_string(),
                    expected,
                    actual: args.len(),
                })?;
                marshal_input(&mut arena, name, index + 1, spec, arg)?
            }
        };
        native_args.push(value);
    }

    let mut slots = Vec::with_capacity(descriptor.outputs.len());
    for output in descriptor.outputs {
        let address = arena.allocate_output(output.kind)?;
        slots.push((output, address));
        native_args.push(address.into());
    }

    trace!(method = name, args = ?native_args, "native arguments");
    let code = arena.engine().call(descriptor.native_name, &native_args)?;
    arena.release_inputs();

    let messages = ctx.messages;
    let warning = check_status(name, code, |code| messages.describe(arena.engine(), code))?;
    if let Some(warning) = warning {
        ctx.warnings.push(warning);
    }

    let mut values = Vec::with_capacity(slots.len());
    for (output, address) in slots {
        values.push((output.name, arena.decode_output(address, output.kind)?));
    }
    Ok(CallOutput::from_values(values))
}

fn check_array_lengths(name: &str, descriptor: &MethodDescriptor, args: &[Arg]) -> Result<()> {
    let lengths: Vec<usize> = descriptor
        .user_inputs()
        .zip(args)
        .filter_map(|(spec, arg)| match (spec, arg) {
            (ArgSpec::NumberArray(_), Arg::Numbers(values)) => Some(values.len()),
            _ => None,
        })
        .collect();
    match lengths.first() {
        Some(first) if lengths.iter().any(|len| len != first) => Err(Error::ArrayLengthMismatch {
            method: name.to_string(),
            lengths,
        }),
        _ => Ok(()),
    }
}

fn derived_length(
    name: &str,
    descriptor: &MethodDescriptor,
    key: &str,
    args: &[Arg],
) -> Result<NativeValue> {
    let invalid = || Error::InvalidDescriptor {
        method: name.to_string(),
        reason: format!("length placeholder '{key}' has no array argument"),
    };
    let position = descriptor.array_position(key).ok_or_else(invalid)?;
    match args.get(position) {
        Some(Arg::Numbers(values)) => {
            let len = i32::try_from(values.len()).map_err(|_| Error::ArgumentType {
                method: name.to_string(),
                position: position + 1,
                expected: "an array shorter than 2^31 elements",
                actual: "an oversized array",
            })?;
            Ok(NativeValue::I32(len))
        }
        Some(other) => Err(Error::ArgumentType {
            method: name.to_string(),
            position: position + 1,
            expected: "a number array",
            actual: other.type_name(),
        }),
        None => Err(invalid()),
    }
}

fn marshal_input(
    arena: &mut ScratchArena<'_>,
    name: &str,
    position: usize,
    spec: &ArgSpec,
    arg: &Arg,
) -> Result<NativeValue> {
    let mismatch = |expected| Error::ArgumentType {
        method: name.to_string(),
        position,
        expected,
        actual: arg.type_name(),
    };
    match (spec, arg) {
        (ArgSpec::Scalar, Arg::Int(v)) => Ok(NativeValue::I32(*v)),
        (ArgSpec::Scalar, Arg::Long(v)) => Ok(NativeValue::I64(*v)),
        (ArgSpec::Scalar, Arg::Double(v)) => Ok(NativeValue::F64(*v)),
        (ArgSpec::Scalar, _) => Err(mismatch("a number")),
        (ArgSpec::StringPointer, Arg::Text(text)) => Ok(arena.allocate_string(text)?.into()),
        (ArgSpec::StringPointer, _) => Err(mismatch("a string")),
        (ArgSpec::NumberArray(_), Arg::Numbers(values)) => {
            Ok(arena.allocate_numbers(values)?.into())
        }
        (ArgSpec::NumberArray(_), _) => Err(mismatch("a number array")),
        (ArgSpec::LengthOf(_), _) => Err(mismatch("nothing (derived argument)")),
    }
}
