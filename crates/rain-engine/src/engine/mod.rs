//! Engine context and the script lifecycle driver.

mod driver;
mod error;
mod state;

pub use driver::{Driver, LifecycleState, RunReport};
pub use error::EngineError;
pub use state::{EngineState, SharedEngine};

#[cfg(feature = "lua")]
pub use native::run;

#[cfg(feature = "lua")]
mod native {
    use anyhow::{Context, Result};

    use crate::config::EngineConfig;
    use crate::gfx::WgpuBackend;
    use crate::script::LuaRuntime;
    use crate::window::{WindowSystem, WinitWindow};

    use super::{Driver, EngineError, EngineState, RunReport};

    /// Opens a window, brings up wgpu and Lua, and runs the configured script to completion.
    pub fn run(config: &EngineConfig, frame_limit: Option<u64>) -> Result<RunReport> {
        let window = WinitWindow::new(&config.window).context("failed to create window")?;
        let target = window.gfx_target().ok_or(EngineError::NoGfxTarget)?;
        let gfx = WgpuBackend::new(target, config.gpu_init()).context("failed to initialize GPU")?;

        let engine = EngineState::new(Box::new(window), Box::new(gfx))?;
        let driver = Driver::init(engine, LuaRuntime::new(), &config.script)?;
        Ok(driver.with_frame_limit(frame_limit).run())
    }
}
