//! Engine configuration.
//!
//! Every section has a `Default` that runs the bundled demo; the host binary
//! overrides fields from its command line.

use std::path::PathBuf;

use crate::gfx::GpuInit;
use crate::logging::LoggingConfig;

/// Initial window parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    /// Logical size in pixels.
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Mokosh (Engine)".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Where the script assembly lives and how its hooks are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    pub assembly: PathBuf,
    /// Class whose `Entry`, `Update`, `Render` and `Destroy` methods are the hooks.
    pub entry_class: String,
    /// Namespace the internal calls are registered under.
    pub interop_namespace: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            assembly: PathBuf::from("scripts/main.lua"),
            entry_class: "RainEngine.Main".to_string(),
            interop_namespace: "RainNative.Interop".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub gpu: GpuInit,
    pub script: ScriptConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// GPU settings with the window's vsync preference applied.
    pub fn gpu_init(&self) -> GpuInit {
        self.gpu.clone().with_vsync(self.window.vsync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_bundled_script() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.script.assembly, PathBuf::from("scripts/main.lua"));
        assert_eq!(cfg.script.entry_class, "RainEngine.Main");
        assert_eq!((cfg.window.width, cfg.window.height), (1280, 720));
    }

    #[test]
    fn vsync_off_picks_non_blocking_present_mode() {
        let mut cfg = EngineConfig::default();
        cfg.window.vsync = false;
        assert_eq!(cfg.gpu_init().present_mode, wgpu::PresentMode::AutoNoVsync);
    }
}
