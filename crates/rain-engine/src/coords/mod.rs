//! Small math and geometry types shared by the renderer and the bridge.
//!
//! Conventions:
//! - colors are straight (non-premultiplied) RGBA
//! - matrices are row-major, exactly as the script sends them
//! - source rectangles are in texture pixels

mod color;
mod mat4;
mod rect;

pub use color::ColorRgba;
pub use mat4::Mat4;
pub use rect::{SourceRect, UvRect};
