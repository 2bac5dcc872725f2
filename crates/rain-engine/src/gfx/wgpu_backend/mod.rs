//! wgpu implementation of `GfxBackend`.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue and the window surface
//! - mapping backend-neutral ids onto wgpu objects
//! - recording passes and replaying them once per commit

mod backend;
mod convert;
mod frame;
mod init;
mod surface;

pub use backend::WgpuBackend;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
