//! Host-side arguments and decoded results.

use std::fmt;

use crate::error::{Error, Result};

/// A user-supplied argument to a facade method.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Numbers(Vec<f64>),
}

impl Arg {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Text(_) => "string",
            Self::Numbers(_) => "number array",
        }
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<f64>> for Arg {
    fn from(v: Vec<f64>) -> Self {
        Self::Numbers(v)
    }
}

impl From<&[f64]> for Arg {
    fn from(v: &[f64]) -> Self {
        Self::Numbers(v.to_vec())
    }
}

/// A value decoded from an output slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Long(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// The shaped result of a facade call.
///
/// Zero output slots give [`CallOutput::None`], one gives the bare value,
/// several give a record keyed by the declared output names.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    None,
    Single(Value),
    Record(Vec<(&'static str, Value)>),
}

impl CallOutput {
    pub(crate) fn from_values(mut values: Vec<(&'static str, Value)>) -> Self {
        match values.len() {
            0 => Self::None,
            1 => values.pop().map_or(Self::None, |(_, v)| Self::Single(v)),
            _ => Self::Record(values),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Field of a record result.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Field names of a record result, in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        match self {
            Self::Record(fields) => fields.iter().map(|(n, _)| *n).collect(),
            _ => Vec::new(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::None => "nothing".to_string(),
            Self::Single(v) => format!("{v:?}"),
            Self::Record(_) => format!("record {:?}", self.field_names()),
        }
    }

    fn unexpected(&self, method: &str, expected: &'static str) -> Error {
        Error::UnexpectedOutput {
            method: method.to_string(),
            expected,
            actual: self.describe(),
        }
    }

    pub fn into_unit(self, method: &str) -> Result<()> {
        match self {
            Self::None => Ok(()),
            other => Err(other.unexpected(method, "nothing")),
        }
    }

    pub fn into_value(self, method: &str) -> Result<Value> {
        match self {
            Self::Single(v) => Ok(v),
            other => Err(other.unexpected(method, "a single value")),
        }
    }

    pub fn into_int(self, method: &str) -> Result<i32> {
        match &self {
            Self::Single(v) => v.as_i32().ok_or_else(|| self.unexpected(method, "an int")),
            _ => Err(self.unexpected(method, "an int")),
        }
    }

    pub fn into_long(self, method: &str) -> Result<i64> {
        match &self {
            Self::Single(v) => v.as_i64().ok_or_else(|| self.unexpected(method, "a long")),
            _ => Err(self.unexpected(method, "a long")),
        }
    }

    pub fn into_double(self, method: &str) -> Result<f64> {
        match &self {
            Self::Single(v) => v.as_f64().ok_or_else(|| self.unexpected(method, "a double")),
            _ => Err(self.unexpected(method, "a double")),
        }
    }

    pub fn into_text(self, method: &str) -> Result<String> {
        match self {
            Self::Single(Value::Text(s)) => Ok(s),
            other => Err(other.unexpected(method, "a string")),
        }
    }

    /// Typed field of a record result.
    pub fn field<T>(&self, method: &str, name: &str, extract: impl FnOnce(&Value) -> Option<T>) -> Result<T> {
        self.get(name)
            .and_then(extract)
            .ok_or_else(|| Error::UnexpectedOutput {
                method: method.to_string(),
                expected: "a record with the declared fields",
                actual: format!("{} (missing or mistyped '{name}')", self.describe()),
            })
    }
}
