//! EPANET version handling and the session/method version gates.
//!
//! The engine reports its version as a single integer,
//! `major * 10000 + minor * 100 + patch` (2.2.0 is `20200`).

use std::fmt;
use std::str::FromStr;

use crate::engine::EngineHandle;
use crate::error::{Error, Result};
use crate::logging::{debug, info};
use crate::marshal::ScratchArena;
use crate::signature::OutputKind;

/// Entry point queried once per session. Takes no project handle.
pub const GET_VERSION: &str = "EN_getversion";

/// Oldest engine release this library supports.
pub const MINIMUM_SUPPORTED: EngineVersion = EngineVersion::new(2, 2, 0);

/// Error returned when parsing an [`EngineVersion`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError {
    input: String,
    reason: &'static str,
}

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseVersionError {}

/// Version of a loaded EPANET engine.
///
/// # Example
///
/// ```
/// use epanet_wasm::EngineVersion;
///
/// let v = EngineVersion::from_encoded(20300).unwrap();
/// assert_eq!(v.to_string(), "2.3.0");
/// assert_eq!(v.encoded(), 20300);
/// assert!(v > "2.2.0".parse().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl EngineVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Decode the integer form reported by `EN_getversion`.
    pub fn from_encoded(encoded: i32) -> Option<Self> {
        let encoded = u32::try_from(encoded).ok()?;
        Some(Self::new(encoded / 10000, (encoded % 10000) / 100, encoded % 100))
    }

    pub const fn encoded(&self) -> u32 {
        self.major * 10000 + self.minor * 100 + self.patch
    }

    /// Whether this engine is at least `required`.
    pub fn satisfies(&self, required: &Self) -> bool {
        self >= required
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for EngineVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let error = |reason| ParseVersionError {
            input: s.to_string(),
            reason,
        };
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let mut parts = trimmed.split('.');
        let mut component = |name| -> std::result::Result<u32, ParseVersionError> {
            let part = parts.next().ok_or_else(|| error(name))?;
            let value: u32 = part.parse().map_err(|_| error("components must be integers"))?;
            Ok(value)
        };
        let major = component("missing major version")?;
        let minor = component("missing minor version")?;
        let patch = component("missing patch version")?;
        if parts.next().is_some() {
            return Err(error("too many components"));
        }
        if minor > 99 || patch > 99 {
            return Err(error("minor and patch must be below 100"));
        }
        Ok(Self::new(major, minor, patch))
    }
}

/// Query the engine version and enforce [`MINIMUM_SUPPORTED`].
///
/// Runs once during session construction. Fails with
/// [`Error::VersionQuery`] when the entry point is missing or reports an
/// error, and with [`Error::VersionTooLow`] below the floor.
pub fn resolve_version(engine: &mut dyn EngineHandle) -> Result<EngineVersion> {
    if !engine.has_function(GET_VERSION) {
        return Err(Error::VersionQuery(format!(
            "engine does not export '{GET_VERSION}'; minimum required version is {MINIMUM_SUPPORTED}"
        )));
    }

    let encoded = query_encoded(engine).map_err(|e| match e {
        Error::VersionQuery(_) => e,
        other => Error::VersionQuery(other.to_string()),
    })?;
    let version = EngineVersion::from_encoded(encoded)
        .ok_or_else(|| Error::VersionQuery(format!("engine reported invalid version {encoded}")))?;

    if !version.satisfies(&MINIMUM_SUPPORTED) {
        return Err(Error::VersionTooLow {
            loaded: version,
            minimum: MINIMUM_SUPPORTED,
        });
    }

    info!(version = %version, "resolved engine version");
    Ok(version)
}

fn query_encoded(engine: &mut dyn EngineHandle) -> Result<i32> {
    let mut arena = ScratchArena::new(engine, GET_VERSION);
    let slot = arena.allocate_output(OutputKind::Int)?;
    let code = arena.engine().call(GET_VERSION, &[slot.into()])?;
    if code != 0 {
        return Err(Error::VersionQuery(format!(
            "{GET_VERSION} failed with code {code}"
        )));
    }
    let value = arena.decode_output(slot, OutputKind::Int)?;
    value.as_i32().ok_or_else(|| Error::VersionQuery(format!("unexpected value {value:?}")))
}

/// Per-call gate for methods that declare a minimum version.
pub fn ensure_supported(method: &str, required: EngineVersion, loaded: EngineVersion) -> Result<()> {
    if loaded.satisfies(&required) {
        return Ok(());
    }
    debug!(method, %required, %loaded, "method rejected by version gate");
    Err(Error::UnsupportedVersion {
        method: method.to_string(),
        required,
        loaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        let v = EngineVersion::from_encoded(20200).unwrap();
        assert_eq!(v, EngineVersion::new(2, 2, 0));
        assert_eq!(v.encoded(), 20200);
        assert_eq!(EngineVersion::from_encoded(20301).unwrap().to_string(), "2.3.1");
        assert_eq!(EngineVersion::from_encoded(-1), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("2.2.0".parse(), Ok(EngineVersion::new(2, 2, 0)));
        assert_eq!("v2.3.1".parse(), Ok(EngineVersion::new(2, 3, 1)));
        assert!("2.2".parse::<EngineVersion>().is_err());
        assert!("2.2.0.1".parse::<EngineVersion>().is_err());
        assert!("2.x.0".parse::<EngineVersion>().is_err());
        assert!("2.100.0".parse::<EngineVersion>().is_err());
    }

    #[test]
    fn test_ordering_matches_encoding() {
        let older = EngineVersion::from_encoded(20100).unwrap();
        let newer = EngineVersion::from_encoded(20300).unwrap();
        assert!(older < MINIMUM_SUPPORTED);
        assert!(newer.satisfies(&MINIMUM_SUPPORTED));
        assert!(MINIMUM_SUPPORTED.satisfies(&MINIMUM_SUPPORTED));
    }

    #[test]
    fn test_gate_message_names_both_versions() {
        let err = ensure_supported(
            "setCurveType",
            EngineVersion::new(2, 3, 0),
            EngineVersion::new(2, 2, 0),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("setCurveType"));
        assert!(message.contains("2.3.0"));
        assert!(message.contains("2.2.0"));
    }
}
