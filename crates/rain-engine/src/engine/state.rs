use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::gfx::GfxBackend;
use crate::render::Renderer;
use crate::resource::{ImageCrateDecoder, ImageDecoder, Resources};
use crate::window::WindowSystem;

use super::error::EngineError;

/// The engine context shared between the driver and the internal calls.
///
/// Single-threaded by construction (`Rc<RefCell<_>>` is `!Send`).
pub type SharedEngine = Rc<RefCell<EngineState>>;

thread_local! {
    static ENGINE_LIVE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the thread's engine slot as taken until dropped.
#[derive(Debug)]
struct InstanceGuard(());

impl InstanceGuard {
    fn acquire() -> Result<Self, EngineError> {
        ENGINE_LIVE.with(|live| {
            if live.replace(true) {
                Err(EngineError::AlreadyRunning)
            } else {
                Ok(Self(()))
            }
        })
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        ENGINE_LIVE.with(|live| live.set(false));
    }
}

/// Everything internal calls can touch: the window, the renderer, resource
/// tables and the last frame delta.
///
/// Field order is drop order: the renderer (and its GPU backend) goes before
/// the window whose surface it draws into.
pub struct EngineState {
    pub renderer: Renderer,
    pub resources: Resources,
    pub decoder: Box<dyn ImageDecoder>,
    pub window: Box<dyn WindowSystem>,
    /// Seconds between the last two frames.
    pub delta_time: f32,
    _guard: InstanceGuard,
}

impl EngineState {
    /// Builds the renderer on `gfx`. Fails if another engine is alive on this thread.
    pub fn new(window: Box<dyn WindowSystem>, gfx: Box<dyn GfxBackend>) -> Result<Self> {
        let guard = InstanceGuard::acquire()?;
        let renderer = Renderer::new(gfx).context("failed to initialize renderer")?;

        Ok(Self {
            renderer,
            resources: Resources::default(),
            decoder: Box::new(ImageCrateDecoder),
            window,
            delta_time: 0.0,
            _guard: guard,
        })
    }

    /// Releases resources scripts never destroyed. Passes go before textures.
    pub fn release_leaked(&mut self) {
        let leaked = self.resources.outstanding();
        if leaked == 0 {
            return;
        }
        log::warn!("{leaked} script resource(s) were never destroyed; releasing them");

        let gfx = self.renderer.gfx_mut();
        let passes: Vec<_> = self.resources.passes.iter().map(|(h, _)| h).collect();
        for handle in passes {
            if let Ok(pass) = self.resources.passes.remove(handle) {
                pass.destroy(gfx);
            }
        }
        let textures: Vec<_> = self.resources.textures.iter().map(|(h, _)| h).collect();
        for handle in textures {
            if let Ok(mut texture) = self.resources.textures.remove(handle) {
                texture.destroy(gfx);
            }
        }
    }

    /// Leaked resources, then the renderer, then the window.
    pub fn shutdown(mut self) {
        self.release_leaked();
        self.renderer.deinit();
        drop(self);
        log::debug!("engine state destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::gfx::{Call, PixelFormat, RecordingBackend};
    use crate::resource::{Texture, TextureDesc};
    use crate::window::HeadlessWindow;

    fn state() -> Result<EngineState> {
        EngineState::new(
            Box::new(HeadlessWindow::new(&WindowConfig::default())),
            Box::new(RecordingBackend::new()),
        )
    }

    #[test]
    fn second_instance_is_rejected() {
        let first = state().unwrap();
        let err = state().err().unwrap();
        assert!(matches!(err.downcast_ref::<EngineError>(), Some(EngineError::AlreadyRunning)));
        drop(first);
        assert!(state().is_ok());
    }

    #[test]
    fn shutdown_releases_leaked_resources() {
        let gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let mut state = EngineState::new(
            Box::new(HeadlessWindow::new(&WindowConfig::default())),
            Box::new(gfx),
        )
        .unwrap();
        let handle = state.resources.textures.insert(Texture::default());
        let EngineState {
            renderer, resources, ..
        } = &mut state;
        resources
            .textures
            .get_mut(handle)
            .unwrap()
            .init(
                renderer.gfx_mut(),
                &TextureDesc {
                    render_target: false,
                    width: 4,
                    height: 4,
                    sample_count: 1,
                    format: PixelFormat::Rgba8,
                },
            )
            .unwrap();
        let with_texture = probe.live_resources();

        state.shutdown();
        assert_eq!(probe.count(|c| matches!(c, Call::DestroyImage(_))), 1);
        assert!(with_texture > 0);
        assert_eq!(probe.live_resources(), 0);
        assert!(probe.is_shut_down());
    }
}
