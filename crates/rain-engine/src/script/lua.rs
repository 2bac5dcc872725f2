//! `ScriptRuntime` on an embedded Lua 5.4 state.
//!
//! Classes are nested global tables (`RainEngine.Main` is `RainEngine["Main"]`)
//! and methods are plain functions stored in them. Internal calls land in the
//! same kind of nested table under the interop namespace.

use std::collections::BTreeMap;
use std::path::Path;

use mlua::{Function, Lua, MultiValue, Table};

use crate::bridge::{self, InternalCallTable};
use crate::engine::SharedEngine;

use super::{MethodId, ScriptError, ScriptRuntime, Value};

pub struct LuaRuntime {
    lua: Option<Lua>,
    methods: Vec<(String, Function)>,
}

impl LuaRuntime {
    pub fn new() -> Self {
        Self {
            lua: Some(Lua::new()),
            methods: Vec::new(),
        }
    }

    fn lua(&self) -> Result<&Lua, ScriptError> {
        self.lua.as_ref().ok_or(ScriptError::ShutDown)
    }

    /// Runs a chunk of source directly; used by tests and tooling.
    pub fn exec(&mut self, name: &str, source: &str) -> Result<(), ScriptError> {
        self.lua()?
            .load(source)
            .set_name(name)
            .exec()
            .map_err(|err| ScriptError::Load {
                path: name.to_string(),
                reason: err.to_string(),
            })
    }
}

impl Default for LuaRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks `a.b.c` from the globals, creating missing tables when `create` is set.
fn table_path(lua: &Lua, path: &str, create: bool) -> mlua::Result<Option<Table>> {
    let mut table = lua.globals();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let next = match table.get::<mlua::Value>(segment)? {
            mlua::Value::Table(t) => t,
            mlua::Value::Nil if create => {
                let t = lua.create_table()?;
                table.set(segment, t.clone())?;
                t
            }
            _ => return Ok(None),
        };
        table = next;
    }
    Ok(Some(table))
}

fn from_lua(value: mlua::Value) -> Value {
    match value {
        mlua::Value::Nil => Value::Nil,
        mlua::Value::Boolean(b) => Value::Bool(b),
        mlua::Value::Integer(i) => Value::Int(i),
        mlua::Value::Number(n) => Value::Float(n),
        mlua::Value::String(s) => Value::Text(s.as_bytes().to_vec()),
        mlua::Value::Table(t) => table_value(&t),
        other => {
            log::debug!("lua {} passed to native code as nil", other.type_name());
            Value::Nil
        }
    }
}

/// Arrays of numbers become `Floats`, anything else a `Record` of its string keys.
fn table_value(table: &Table) -> Value {
    if table.raw_len() > 0 {
        let floats: mlua::Result<Vec<f32>> = table
            .sequence_values::<f64>()
            .map(|v| v.map(|f| f as f32))
            .collect();
        if let Ok(floats) = floats {
            return Value::Floats(floats);
        }
    }

    let mut fields = BTreeMap::new();
    for pair in table.pairs::<mlua::Value, mlua::Value>() {
        let Ok((key, value)) = pair else { continue };
        if let mlua::Value::String(key) = key {
            fields.insert(key.to_string_lossy().to_string(), from_lua(value));
        }
    }
    Value::Record(fields)
}

fn to_lua(lua: &Lua, value: Value) -> mlua::Result<mlua::Value> {
    Ok(match value {
        Value::Nil => mlua::Value::Nil,
        Value::Bool(b) => mlua::Value::Boolean(b),
        Value::Int(i) => mlua::Value::Integer(i),
        Value::Float(f) => mlua::Value::Number(f),
        Value::Handle(h) => mlua::Value::Integer(h as i64),
        // Copied into a Lua-owned string; the Lua GC owns it from here.
        Value::Text(bytes) => mlua::Value::String(lua.create_string(&bytes)?),
        Value::Floats(v) => mlua::Value::Table(lua.create_sequence_from(v)?),
        Value::Record(fields) => {
            let t = lua.create_table()?;
            for (k, v) in fields {
                t.set(k, to_lua(lua, v)?)?;
            }
            mlua::Value::Table(t)
        }
    })
}

impl ScriptRuntime for LuaRuntime {
    fn load_assembly(&mut self, path: &Path) -> Result<(), ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|err| ScriptError::Load {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        self.exec(&path.display().to_string(), &source)?;
        log::info!("loaded script assembly {}", path.display());
        Ok(())
    }

    fn register_internal_calls(
        &mut self,
        namespace: &str,
        calls: &InternalCallTable,
        engine: SharedEngine,
    ) -> Result<(), ScriptError> {
        let lua = self.lua()?;
        let register = || -> mlua::Result<()> {
            let Some(ns) = table_path(lua, namespace, true)? else {
                return Err(mlua::Error::RuntimeError(format!(
                    "'{namespace}' is not a table"
                )));
            };
            for (name, call) in calls.iter() {
                let engine = engine.clone();
                let func = lua.create_function(move |lua, args: MultiValue| {
                    let values: Vec<Value> = args.into_iter().map(from_lua).collect();
                    let result = bridge::dispatch(&engine, name, call, &values);
                    to_lua(lua, result)
                })?;
                ns.set(name, func)?;
            }
            Ok(())
        };
        register().map_err(|err| ScriptError::Register(err.to_string()))?;
        log::debug!("registered {} internal calls under {namespace}", calls.len());
        Ok(())
    }

    fn resolve(&mut self, name: &str) -> Option<MethodId> {
        let (class, method) = name.split_once(':')?;
        let lua = self.lua.as_ref()?;
        let class = table_path(lua, class, false).ok().flatten()?;
        let func = class.get::<Option<Function>>(method).ok().flatten()?;

        let id = MethodId(self.methods.len() as u32);
        self.methods.push((name.to_string(), func));
        Some(id)
    }

    fn invoke(&mut self, method: MethodId, args: &[Value]) -> Result<Value, ScriptError> {
        let lua = self.lua()?;
        let (name, func) = self
            .methods
            .get(method.0 as usize)
            .ok_or(ScriptError::UnknownMethod(method))?;

        let fault = |err: mlua::Error| ScriptError::Fault {
            method: name.clone(),
            message: err.to_string(),
        };
        let args = args
            .iter()
            .cloned()
            .map(|v| to_lua(lua, v))
            .collect::<mlua::Result<MultiValue>>()
            .map_err(fault)?;
        let result = func.call::<mlua::Value>(args).map_err(fault)?;
        Ok(from_lua(result))
    }

    fn shutdown(&mut self) {
        self.methods.clear();
        // Dropping the state drops the registered closures and their engine references.
        if self.lua.take().is_some() {
            log::debug!("lua runtime shut down");
        }
    }
}

impl Drop for LuaRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
