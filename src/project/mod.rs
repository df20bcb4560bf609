//! The public facade: one EPANET project bound to a loaded engine.
//!
//! A [`Project`] owns the engine, the project handle created at
//! construction, the resolved engine version and one bound method per row
//! of the signature table. Methods are reachable by name through
//! [`Project::call`] or through the typed wrappers in this module.
//!
//! # Example
//!
//! ```ignore
//! use epanet_wasm::prelude::*;
//!
//! let engine = WasmtimeEngine::from_file("epanet.wasm")?;
//! let mut project = Project::new(engine)?;
//! project.init("", "", FlowUnits::Gpm, HeadLossType::HazenWilliams)?;
//! let j1 = project.add_node("J1", NodeType::Junction)?;
//! assert_eq!(project.get_node_index("J1")?, j1);
//! ```

mod api;
pub mod types;

use std::fmt;

use crate::engine::{EngineHandle, NativeValue};
use crate::error::{Error, Result, Warning};
use crate::logging::{debug, error, info, warn};
use crate::marshal::{Arg, CallContext, CallOutput, MethodFactory, MethodTable, ScratchArena};
use crate::signature::{OutputKind, SIGNATURE_TABLE};
use crate::status::{EngineMessages, ErrorMessages, Status};
use crate::version::{EngineVersion, resolve_version};

/// Entry point that creates the project handle.
pub const CREATE_PROJECT: &str = "EN_createproject";

/// Entry point that releases the project handle.
pub const DELETE_PROJECT: &str = "EN_deleteproject";

/// Handle to a project inside the engine.
///
/// Passed as the first argument of every table-driven call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectHandle(i32);

impl ProjectHandle {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ProjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project@{:#x}", self.0)
    }
}

impl From<ProjectHandle> for NativeValue {
    fn from(handle: ProjectHandle) -> Self {
        Self::I32(handle.0)
    }
}

/// An EPANET project session.
pub struct Project<E: EngineHandle> {
    engine: E,
    handle: ProjectHandle,
    version: EngineVersion,
    messages: Box<dyn ErrorMessages>,
    methods: MethodTable,
    warnings: Vec<Warning>,
    deleted: bool,
}

impl<E: EngineHandle> fmt::Debug for Project<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("handle", &self.handle)
            .field("version", &self.version)
            .field("methods", &self.methods.len())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}

impl<E: EngineHandle> Project<E> {
    /// Create a project, resolving status messages through the engine.
    pub fn new(engine: E) -> Result<Self> {
        Self::with_messages(engine, Box::new(EngineMessages))
    }

    /// Create a project with a custom status-message lookup.
    ///
    /// Creates the project handle, resolves and checks the engine version,
    /// then binds every signature table row. If the version check fails
    /// the handle is deleted before the error is returned.
    pub fn with_messages(mut engine: E, messages: Box<dyn ErrorMessages>) -> Result<Self> {
        let handle = create_project(&mut engine, messages.as_ref())?;

        let version = match resolve_version(&mut engine) {
            Ok(version) => version,
            Err(e) => {
                if let Err(cleanup) = delete_project(&mut engine, handle, messages.as_ref()) {
                    warn!(%handle, error = %cleanup, "failed to delete project after version error");
                }
                return Err(e);
            }
        };

        let methods = MethodFactory::build_all(SIGNATURE_TABLE, &mut engine);
        info!(%handle, %version, methods = methods.len(), "project ready");

        Ok(Self {
            engine,
            handle,
            version,
            messages,
            methods,
            warnings: Vec::new(),
            deleted: false,
        })
    }

    /// Invoke a table method by name.
    pub fn call(&mut self, name: &str, args: &[Arg]) -> Result<CallOutput> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))?;
        let mut ctx = CallContext {
            engine: &mut self.engine,
            project: self.handle,
            version: self.version,
            messages: self.messages.as_ref(),
            warnings: &mut self.warnings,
        };
        method(&mut ctx, args)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Names of all bound methods, sorted.
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn version(&self) -> EngineVersion {
        self.version
    }

    pub fn handle(&self) -> ProjectHandle {
        self.handle
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Warnings raised by calls since the last [`take_warnings`](Self::take_warnings).
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Delete the project inside the engine, reporting failures.
    ///
    /// Dropping a `Project` does the same but can only log errors.
    pub fn delete(mut self) -> Result<()> {
        self.deleted = true;
        delete_project(&mut self.engine, self.handle, self.messages.as_ref())
    }
}

impl<E: EngineHandle> Drop for Project<E> {
    fn drop(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        if let Err(e) = delete_project(&mut self.engine, self.handle, self.messages.as_ref()) {
            error!(handle = %self.handle, error = %e, "failed to delete project");
        }
    }
}

fn create_project(
    engine: &mut dyn EngineHandle,
    messages: &dyn ErrorMessages,
) -> Result<ProjectHandle> {
    if !engine.has_function(CREATE_PROJECT) {
        return Err(Error::Bootstrap(format!(
            "engine does not export '{CREATE_PROJECT}'"
        )));
    }
    let bootstrap = |e: Error| Error::Bootstrap(e.to_string());

    let mut arena = ScratchArena::new(engine, CREATE_PROJECT);
    let slot = arena.allocate_output(OutputKind::Int).map_err(bootstrap)?;
    let code = arena
        .engine()
        .call(CREATE_PROJECT, &[slot.into()])
        .map_err(|e| bootstrap(e.into()))?;
    if let Status::Error(code) = Status::classify(code) {
        let message = messages.describe(arena.engine(), code);
        return Err(Error::Bootstrap(format!(
            "{CREATE_PROJECT} returned {code}: {message}"
        )));
    }

    let raw = arena
        .decode_output(slot, OutputKind::Int)
        .map_err(bootstrap)?
        .as_i32()
        .unwrap_or_default();
    if raw == 0 {
        return Err(Error::Bootstrap(
            "engine returned a null project handle".to_string(),
        ));
    }
    let handle = ProjectHandle::new(raw);
    info!(%handle, "created project");
    Ok(handle)
}

fn delete_project(
    engine: &mut dyn EngineHandle,
    handle: ProjectHandle,
    messages: &dyn ErrorMessages,
) -> Result<()> {
    if !engine.has_function(DELETE_PROJECT) {
        debug!(%handle, "engine does not export {DELETE_PROJECT}, leaving project in place");
        return Ok(());
    }
    let code = engine.call(DELETE_PROJECT, &[handle.into()])?;
    if let Status::Error(code) = Status::classify(code) {
        return Err(Error::NativeCall {
            method: DELETE_PROJECT.to_string(),
            code,
            message: messages.describe(engine, code),
        });
    }
    debug!(%handle, "deleted project");
    Ok(())
}
