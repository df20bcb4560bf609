//! Declarative signatures for table-driven entry points.
//!
//! A [`MethodDescriptor`] describes how one public method maps onto one
//! native entry point: which user arguments are passed through, which are
//! marshalled into scratch memory, which are derived, and which output
//! slots the entry point writes to. Supporting a new entry point means
//! adding a row to [`SIGNATURE_TABLE`].

mod table;

use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::version::EngineVersion;

pub use table::SIGNATURE_TABLE;

/// How one native input parameter is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    /// A number passed through unchanged.
    Scalar,
    /// A string copied into scratch memory, NUL terminated.
    StringPointer,
    /// An `f64` array copied into scratch memory, tagged with a key.
    NumberArray(&'static str),
    /// Length of the [`NumberArray`](Self::NumberArray) with the same key.
    /// Not supplied by the caller.
    LengthOf(&'static str),
}

impl ArgSpec {
    /// Whether the caller supplies this argument.
    pub const fn is_user_supplied(&self) -> bool {
        !matches!(self, Self::LengthOf(_))
    }
}

/// Primitive type of an output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    Double,
    /// Short identifier buffer (`MAXID + 1`).
    Id,
    /// Title-length string buffer.
    Title,
}

impl OutputKind {
    /// Scratch bytes reserved for the slot.
    pub const fn size(self) -> usize {
        match self {
            Self::Int => 4,
            Self::Long | Self::Double => 8,
            Self::Id => 32,
            Self::Title => 80,
        }
    }

    pub const fn is_string(self) -> bool {
        matches!(self, Self::Id | Self::Title)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Id => "char",
            Self::Title => "char-title",
        };
        f.write_str(name)
    }
}

/// A named output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: &'static str,
    pub kind: OutputKind,
}

/// Shorthand for table rows.
pub const fn out(name: &'static str, kind: OutputKind) -> OutputSpec {
    OutputSpec { name, kind }
}

/// Marshalling metadata for one public method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Entry point name as exported by the engine.
    pub native_name: &'static str,
    pub inputs: &'static [ArgSpec],
    pub outputs: &'static [OutputSpec],
    pub min_version: Option<EngineVersion>,
}

impl MethodDescriptor {
    pub const fn new(
        native_name: &'static str,
        inputs: &'static [ArgSpec],
        outputs: &'static [OutputSpec],
    ) -> Self {
        Self {
            native_name,
            inputs,
            outputs,
            min_version: None,
        }
    }

    /// Require at least `version` to call this method.
    pub const fn since(self, version: EngineVersion) -> Self {
        Self {
            min_version: Some(version),
            ..self
        }
    }

    /// Number of arguments the caller supplies.
    pub fn user_arity(&self) -> usize {
        self.inputs.iter().filter(|spec| spec.is_user_supplied()).count()
    }

    /// Specs of the user-supplied arguments, in caller order.
    pub fn user_inputs(&self) -> impl Iterator<Item = &ArgSpec> {
        self.inputs.iter().filter(|spec| spec.is_user_supplied())
    }

    /// Caller-order index of the array argument tagged `key`.
    pub fn array_position(&self, key: &str) -> Option<usize> {
        self.user_inputs()
            .position(|spec| matches!(spec, ArgSpec::NumberArray(k) if *k == key))
    }

    /// Check that the row is internally consistent.
    ///
    /// Every [`ArgSpec::LengthOf`] key must match exactly one
    /// [`ArgSpec::NumberArray`] key, and output names must be unique.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for spec in self.inputs {
            if let ArgSpec::LengthOf(key) = spec {
                let matches = self
                    .inputs
                    .iter()
                    .filter(|s| matches!(s, ArgSpec::NumberArray(k) if k == key))
                    .count();
                if matches != 1 {
                    return Err(format!(
                        "length placeholder '{key}' matches {matches} array argument(s), expected exactly 1"
                    ));
                }
            }
        }

        let mut names = HashSet::new();
        for output in self.outputs {
            if !names.insert(output.name) {
                return Err(format!("duplicate output name '{}'", output.name));
            }
        }
        Ok(())
    }
}

/// Validate a whole table: unique method names and consistent rows.
pub fn validate_table(table: &[(&'static str, MethodDescriptor)]) -> Result<()> {
    let mut seen = HashSet::new();
    for (name, descriptor) in table {
        if !seen.insert(*name) {
            return Err(Error::InvalidDescriptor {
                method: name.to_string(),
                reason: "method defined more than once".to_string(),
            });
        }
        descriptor
            .validate()
            .map_err(|reason| Error::InvalidDescriptor {
                method: name.to_string(),
                reason,
            })?;
    }
    Ok(())
}

/// Look up a row by method name.
pub fn find(name: &str) -> Option<&'static MethodDescriptor> {
    SIGNATURE_TABLE
        .iter()
        .find(|(method, _)| *method == name)
        .map(|(_, descriptor)| descriptor)
}

#[cfg(test)]
mod tests {
    use super::ArgSpec::*;
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        validate_table(SIGNATURE_TABLE).unwrap();
    }

    #[test]
    fn test_user_arity_skips_derived_lengths() {
        let set_curve = find("setCurve").unwrap();
        assert_eq!(set_curve.inputs.len(), 4);
        assert_eq!(set_curve.user_arity(), 3);
        assert_eq!(set_curve.array_position("x"), Some(1));
        assert_eq!(set_curve.array_position("y"), Some(2));
        assert_eq!(set_curve.array_position("z"), None);
    }

    #[test]
    fn test_dangling_length_is_rejected() {
        let descriptor = MethodDescriptor::new("EN_setpattern", &[Scalar, LengthOf("values")], &[]);
        let reason = descriptor.validate().unwrap_err();
        assert!(reason.contains("'values'"));
    }

    #[test]
    fn test_ambiguous_length_is_rejected() {
        let descriptor = MethodDescriptor::new(
            "EN_setpattern",
            &[NumberArray("v"), NumberArray("v"), LengthOf("v")],
            &[],
        );
        assert!(descriptor.validate().is_err());
    }

    static DUPLICATE_X: [OutputSpec; 2] = [
        out("x", OutputKind::Double),
        out("x", OutputKind::Double),
    ];

    #[test]
    fn test_duplicate_outputs_are_rejected() {
        let descriptor = MethodDescriptor::new("EN_getcoord", &[Scalar], &DUPLICATE_X);
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_duplicate_methods_are_rejected() {
        let row = ("close", MethodDescriptor::new("EN_close", &[], &[]));
        assert!(matches!(
            validate_table(&[row, row]),
            Err(Error::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_output_sizes() {
        assert_eq!(OutputKind::Int.size(), 4);
        assert_eq!(OutputKind::Long.size(), 8);
        assert_eq!(OutputKind::Double.size(), 8);
        assert_eq!(OutputKind::Id.size(), 32);
        assert_eq!(OutputKind::Title.size(), 80);
    }

    #[test]
    fn test_version_gated_rows() {
        let gated: Vec<_> = SIGNATURE_TABLE
            .iter()
            .filter(|(_, d)| d.min_version.is_some())
            .map(|(name, _)| *name)
            .collect();
        assert!(gated.contains(&"setCurveType"));
        assert!(!gated.contains(&"getNodeIndex"));
    }
}
