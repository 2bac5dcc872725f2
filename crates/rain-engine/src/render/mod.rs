//! Quad renderer.
//!
//! Builds the builtin pipelines once, caches the bound pipeline and resource
//! bindings within a frame, and turns quad draws into backend calls.

mod renderer;
mod uniforms;

pub use renderer::{BuiltinSampler, FrameStats, Renderer};
