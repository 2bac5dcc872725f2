//! Scripting runtime seam.
//!
//! The engine only needs to load one script assembly, look methods up by
//! `Class:Method` name, call them with a handful of plain values and expose
//! the internal-call table to them.

mod hooks;
#[cfg(feature = "lua")]
mod lua;
mod value;

use std::path::Path;

use thiserror::Error;

use crate::bridge::InternalCallTable;
use crate::engine::SharedEngine;

pub use hooks::{HookKind, Hooks};
#[cfg(feature = "lua")]
pub use lua::LuaRuntime;
pub use value::Value;

/// Resolved method in a loaded assembly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MethodId(pub u32);

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to load assembly '{path}': {reason}")]
    Load { path: String, reason: String },
    #[error("no assembly loaded")]
    NotLoaded,
    #[error("unknown method id {0:?}")]
    UnknownMethod(MethodId),
    #[error("{method} faulted: {message}")]
    Fault { method: String, message: String },
    #[error("cannot register internal calls: {0}")]
    Register(String),
    #[error("runtime is shut down")]
    ShutDown,
}

/// An embedded managed runtime hosting the game scripts.
pub trait ScriptRuntime {
    /// Loads and runs the top level of the script assembly at `path`.
    fn load_assembly(&mut self, path: &Path) -> Result<(), ScriptError>;

    /// Makes every entry of `calls` callable from scripts under `namespace`.
    ///
    /// The runtime keeps `engine` alive until `shutdown`.
    fn register_internal_calls(
        &mut self,
        namespace: &str,
        calls: &InternalCallTable,
        engine: SharedEngine,
    ) -> Result<(), ScriptError>;

    /// Looks up `Class:Method`; `None` when the class or method does not exist.
    fn resolve(&mut self, name: &str) -> Option<MethodId>;

    fn invoke(&mut self, method: MethodId, args: &[Value]) -> Result<Value, ScriptError>;

    /// Tears the runtime down and releases everything registered with it.
    fn shutdown(&mut self);
}
