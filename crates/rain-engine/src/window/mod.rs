//! Window seam.
//!
//! The driver polls the window once per frame; the bridge reads title, size
//! and key state through it. Key codes use GLFW numbering (see `keys`).

mod headless;
pub mod keys;
mod winit_window;

use std::sync::Arc;

pub use headless::HeadlessWindow;
pub use winit_window::WinitWindow;

/// Window and input polling as seen by the engine.
pub trait WindowSystem {
    /// True once the user (or the frame budget) asked the window to close.
    fn should_close(&self) -> bool;

    /// Polls events at the end of a frame.
    fn frame(&mut self);

    /// Seconds since the window was created.
    fn get_time(&self) -> f32;

    /// Framebuffer size in physical pixels.
    fn fb_size(&self) -> (u32, u32);

    fn is_key_down(&self, key: i32) -> bool;

    fn title(&self) -> &str;

    fn set_title(&mut self, title: &str);

    /// What a GPU backend needs to build a surface; `None` for windows without one.
    fn gfx_target(&self) -> Option<Arc<winit::window::Window>>;
}
