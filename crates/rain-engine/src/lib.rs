//! Rain engine crate.
//!
//! Native core of a small 2D engine: a quad renderer over a pluggable GPU
//! backend, generation-checked resource handles, and a frame driver that runs
//! scripted lifecycle hooks through an internal-call bridge.

pub mod config;
pub mod coords;
pub mod gfx;
pub mod logging;
pub mod render;
pub mod resource;
pub mod script;
pub mod time;
pub mod window;

pub mod bridge;
pub mod engine;

pub use config::{EngineConfig, ScriptConfig, WindowConfig};
pub use engine::{Driver, EngineError, EngineState, LifecycleState, RunReport, SharedEngine};
