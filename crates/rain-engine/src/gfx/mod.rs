//! GPU backend seam.
//!
//! The renderer talks to the GPU through `GfxBackend`, an immediate-style API
//! with integer ids: create objects, open a pass, apply state, draw, commit.
//! - `WgpuBackend` renders to a window surface and offscreen images
//! - `RecordingBackend` keeps a handle table and a call log

mod recording;
mod types;
pub mod wgpu_backend;

pub use recording::{Call, RecordingBackend, RecordingProbe};
pub use wgpu_backend::{GpuInit, SurfaceErrorAction, WgpuBackend};
pub use types::{
    BlendFactor, BlendState, BufferDesc, BufferId, Bindings, Filter, ImageDesc, ImageId,
    PassAction, PassDesc, PassId, PipelineDesc, PipelineId, PixelFormat, PrimitiveTopology,
    SamplerDesc, SamplerId, ShaderDesc, ShaderId, ShaderStage, Usage, Wrap,
};

/// Immediate-mode GPU interface used by the renderer.
///
/// Creation returns the invalid id on failure (after logging); destroying an
/// invalid or unknown id is a logged no-op. Passes are bracketed by
/// `begin_*_pass`/`end_pass`, and everything recorded since the previous
/// `commit` reaches the screen at the next `commit`.
pub trait GfxBackend {
    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderId;
    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> PipelineId;
    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferId;
    fn make_image(&mut self, desc: &ImageDesc<'_>) -> ImageId;
    fn make_sampler(&mut self, desc: &SamplerDesc) -> SamplerId;
    fn make_pass(&mut self, desc: &PassDesc) -> PassId;

    fn destroy_shader(&mut self, id: ShaderId);
    fn destroy_pipeline(&mut self, id: PipelineId);
    fn destroy_buffer(&mut self, id: BufferId);
    fn destroy_image(&mut self, id: ImageId);
    fn destroy_sampler(&mut self, id: SamplerId);
    fn destroy_pass(&mut self, id: PassId);

    /// Opens a pass on the window's framebuffer of the given size.
    fn begin_default_pass(&mut self, action: &PassAction, width: u32, height: u32);
    fn begin_pass(&mut self, pass: PassId, action: &PassAction);
    fn end_pass(&mut self);

    fn apply_pipeline(&mut self, pipeline: PipelineId);
    fn apply_bindings(&mut self, bindings: &Bindings);
    fn apply_uniforms(&mut self, stage: ShaderStage, slot: u32, data: &[u8]);
    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32);

    /// Submits every pass recorded since the last commit and presents.
    fn commit(&mut self);

    /// Number of objects currently alive in the backend's handle table.
    fn live_resources(&self) -> usize;

    /// True once the device or surface failed for good.
    fn is_lost(&self) -> bool {
        false
    }

    /// Releases everything the backend still owns. Further calls are no-ops.
    fn shutdown(&mut self);
}
