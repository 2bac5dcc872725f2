//! Internal calls: the native functions scripts can reach.
//!
//! Every call has the same shape, `fn(&mut EngineState, &Args) -> Result<Value, BridgeError>`.
//! `dispatch` borrows the shared engine for the duration of one call, logs
//! any error and hands the script `nil` instead. Nothing is raised into the
//! script.

mod args;
mod engine;
mod marshal;
mod render_pass;
mod renderer;
mod texture;
mod window;

use thiserror::Error;

use crate::engine::{EngineState, SharedEngine};
use crate::resource::{HandleError, RenderPassError};
use crate::script::Value;

pub use args::{window_handle, Args, Fields};
pub use marshal::{text_out, ScratchText};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("missing argument {index}")]
    Missing { index: usize },
    #[error("argument {index}: expected {expected}, got {found}")]
    Type {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("argument {index}: {reason}")]
    Range { index: usize, reason: String },
    #[error(transparent)]
    Handle(#[from] HandleError),
    #[error("render pass: {0}")]
    RenderPass(#[from] RenderPassError),
}

pub type InternalCall = fn(&mut EngineState, &Args<'_>) -> Result<Value, BridgeError>;

/// Named internal calls, in registration order.
#[derive(Debug, Clone, Default)]
pub struct InternalCallTable {
    entries: Vec<(&'static str, InternalCall)>,
}

impl InternalCallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `call` under `name`, replacing an earlier entry with the same name.
    pub fn register(&mut self, name: &'static str, call: InternalCall) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = call,
            None => self.entries.push((name, call)),
        }
    }

    pub fn get(&self, name: &str) -> Option<InternalCall> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, InternalCall)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks `name` up and dispatches it. Unknown names log and return nil.
    pub fn call(&self, engine: &SharedEngine, name: &str, args: &[Value]) -> Value {
        match self.get(name) {
            Some(call) => dispatch(engine, name, call, args),
            None => {
                log::warn!("unknown internal call {name}");
                Value::Nil
            }
        }
    }
}

/// Every internal call the engine exposes.
pub fn internal_calls() -> InternalCallTable {
    let mut t = InternalCallTable::new();

    t.register("Debug_Log", engine::debug_log);
    t.register("Engine_GetWindow", engine::get_window);
    t.register("Engine_GetDeltaTime", engine::get_delta_time);

    t.register("Window_SetTitle", window::set_title);
    t.register("Window_GetTitle", window::get_title);
    t.register("Window_GetFramebufferSize", window::get_framebuffer_size);
    t.register("Window_SetFramebufferSize", window::set_framebuffer_size);
    t.register("Window_IsKeyDown", window::is_key_down);

    t.register("Texture_Alloc", texture::alloc);
    t.register("Texture_Init", texture::init);
    t.register("Texture_FromFile", texture::from_file);
    t.register("Texture_GetSize", texture::get_size);
    t.register("Texture_GetFormat", texture::get_format);
    t.register("Texture_DestroyAndFree", texture::destroy_and_free);

    t.register("RenderPass_Alloc", render_pass::alloc);
    t.register("RenderPass_DestroyAndFree", render_pass::destroy_and_free);

    t.register("Renderer_GetBuiltinSampler", renderer::get_builtin_sampler);
    t.register("Renderer_RenderColoredQuad", renderer::render_colored_quad);
    t.register("Renderer_RenderTexturedQuad", renderer::render_textured_quad);
    t.register("Renderer_BeginPass", renderer::begin_pass);
    t.register("Renderer_BeginDefaultPass", renderer::begin_default_pass);
    t.register("Renderer_EndPass", renderer::end_pass);

    t
}

/// Runs one internal call against the shared engine.
pub fn dispatch(engine: &SharedEngine, name: &str, call: InternalCall, args: &[Value]) -> Value {
    let Ok(mut state) = engine.try_borrow_mut() else {
        log::error!("{name}: engine is already borrowed (re-entrant internal call); returning nil");
        return Value::Nil;
    };
    match call(&mut state, &Args::new(args)) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("{name}: {err}");
            Value::Nil
        }
    }
}
