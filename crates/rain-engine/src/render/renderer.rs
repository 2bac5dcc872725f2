use anyhow::Result;

use crate::coords::{ColorRgba, Mat4, SourceRect};
use crate::gfx::{
    Bindings, BlendState, BufferDesc, BufferId, Filter, GfxBackend, PassAction, PassId,
    PipelineDesc, PipelineId, PrimitiveTopology, SamplerDesc, SamplerId, ShaderDesc, ShaderId,
    ShaderStage, Usage,
};
use crate::resource::Texture;

use super::uniforms::{ColoredQuadFs, ColoredQuadVs, TexturedQuadFs, TexturedQuadVs};

/// Unit square as a triangle strip.
const QUAD_VERTICES: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

/// Samplers owned by the renderer, addressable from scripts by code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinSampler {
    Nearest = 0,
    Bilinear = 1,
}

impl BuiltinSampler {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Nearest),
            1 => Some(Self::Bilinear),
            _ => None,
        }
    }
}

/// Counters for the current frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: u32,
    pub pipeline_binds: u32,
    pub binding_changes: u32,
    /// Draws dropped because they were invalid or issued outside a pass.
    pub skipped: u32,
}

struct Builtins {
    colored_shader: ShaderId,
    colored_pipeline: PipelineId,
    textured_shader: ShaderId,
    textured_pipeline: PipelineId,
    quad_buffer: BufferId,
    nearest_sampler: SamplerId,
    bilinear_sampler: SamplerId,
}

impl Builtins {
    fn create(gfx: &mut dyn GfxBackend) -> Result<Self> {
        let colored_shader = gfx.make_shader(&ShaderDesc {
            label: "rain colored quad shader",
            source: include_str!("shaders/colored_quad.wgsl"),
            vs_uniform_size: std::mem::size_of::<ColoredQuadVs>() as u32,
            fs_uniform_size: std::mem::size_of::<ColoredQuadFs>() as u32,
            textured: false,
        });
        anyhow::ensure!(colored_shader.is_valid(), "failed to create colored quad shader");

        let colored_pipeline = gfx.make_pipeline(&PipelineDesc {
            label: "rain colored quad pipeline",
            shader: colored_shader,
            primitive: PrimitiveTopology::TriangleStrip,
            blend: Some(BlendState::ALPHA),
        });
        anyhow::ensure!(colored_pipeline.is_valid(), "failed to create colored quad pipeline");

        let textured_shader = gfx.make_shader(&ShaderDesc {
            label: "rain textured quad shader",
            source: include_str!("shaders/textured_quad.wgsl"),
            vs_uniform_size: std::mem::size_of::<TexturedQuadVs>() as u32,
            fs_uniform_size: std::mem::size_of::<TexturedQuadFs>() as u32,
            textured: true,
        });
        anyhow::ensure!(textured_shader.is_valid(), "failed to create textured quad shader");

        let textured_pipeline = gfx.make_pipeline(&PipelineDesc {
            label: "rain textured quad pipeline",
            shader: textured_shader,
            primitive: PrimitiveTopology::TriangleStrip,
            blend: Some(BlendState::ALPHA),
        });
        anyhow::ensure!(textured_pipeline.is_valid(), "failed to create textured quad pipeline");

        let quad_buffer = gfx.make_buffer(&BufferDesc {
            label: "rain quad vertices",
            usage: Usage::Immutable,
            data: bytemuck::cast_slice(&QUAD_VERTICES),
        });
        anyhow::ensure!(quad_buffer.is_valid(), "failed to create quad vertex buffer");

        let nearest_sampler = gfx.make_sampler(&SamplerDesc::uniform(Filter::Nearest));
        anyhow::ensure!(nearest_sampler.is_valid(), "failed to create nearest sampler");

        let bilinear_sampler = gfx.make_sampler(&SamplerDesc::uniform(Filter::Linear));
        anyhow::ensure!(bilinear_sampler.is_valid(), "failed to create bilinear sampler");

        Ok(Self {
            colored_shader,
            colored_pipeline,
            textured_shader,
            textured_pipeline,
            quad_buffer,
            nearest_sampler,
            bilinear_sampler,
        })
    }

    /// Reverse of creation order.
    fn destroy(self, gfx: &mut dyn GfxBackend) {
        gfx.destroy_sampler(self.bilinear_sampler);
        gfx.destroy_sampler(self.nearest_sampler);
        gfx.destroy_buffer(self.quad_buffer);
        gfx.destroy_pipeline(self.textured_pipeline);
        gfx.destroy_shader(self.textured_shader);
        gfx.destroy_pipeline(self.colored_pipeline);
        gfx.destroy_shader(self.colored_shader);
    }
}

/// Last state applied to the backend in this frame.
#[derive(Debug, Default, Copy, Clone)]
struct BindCache {
    pipeline: PipelineId,
    bindings: Bindings,
}

/// The engine's single renderer.
///
/// Frame protocol: `begin_render`, any number of passes each bracketed by
/// `begin_*_pass`/`end_pass` holding quad draws, then `end_render`.
pub struct Renderer {
    gfx: Box<dyn GfxBackend>,
    builtins: Option<Builtins>,
    cache: BindCache,
    pass_open: bool,
    in_frame: bool,
    warned_outside_pass: bool,
    stats: FrameStats,
}

impl Renderer {
    /// Creates the builtin GPU objects on `gfx`.
    pub fn new(mut gfx: Box<dyn GfxBackend>) -> Result<Self> {
        let builtins = Builtins::create(gfx.as_mut())?;
        log::debug!("renderer ready ({} gpu objects)", gfx.live_resources());
        Ok(Self {
            gfx,
            builtins: Some(builtins),
            cache: BindCache::default(),
            pass_open: false,
            in_frame: false,
            warned_outside_pass: false,
            stats: FrameStats::default(),
        })
    }

    /// Backend access for resource objects (textures, passes).
    pub fn gfx_mut(&mut self) -> &mut dyn GfxBackend {
        self.gfx.as_mut()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The device or its surface is gone; no frame will be presented again.
    pub fn is_lost(&self) -> bool {
        self.gfx.is_lost()
    }

    pub fn builtin_sampler(&self, which: BuiltinSampler) -> SamplerId {
        match (&self.builtins, which) {
            (Some(b), BuiltinSampler::Nearest) => b.nearest_sampler,
            (Some(b), BuiltinSampler::Bilinear) => b.bilinear_sampler,
            (None, _) => SamplerId::INVALID,
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Starts a frame: forgets every cached binding.
    pub fn begin_render(&mut self) {
        debug_assert!(!self.in_frame, "begin_render called twice without end_render");
        self.in_frame = true;
        self.cache = BindCache::default();
        self.stats = FrameStats::default();
        self.warned_outside_pass = false;
    }

    /// Submits everything drawn since `begin_render`.
    pub fn end_render(&mut self) {
        debug_assert!(self.in_frame, "end_render called without begin_render");
        if self.pass_open {
            log::warn!("frame ended with an open pass; closing it");
            self.end_pass();
        }
        self.gfx.commit();
        self.in_frame = false;
    }

    // ── passes ────────────────────────────────────────────────────────────

    /// Opens a pass on the window framebuffer. Returns false if a pass is already open.
    pub fn begin_default_pass(&mut self, action: &PassAction, width: u32, height: u32) -> bool {
        if self.pass_open {
            log::error!("begin_default_pass: a pass is already open; passes do not nest");
            return false;
        }
        self.gfx.begin_default_pass(action, width, height);
        self.open_pass();
        true
    }

    /// Opens an offscreen pass. Returns false if a pass is already open.
    pub fn begin_pass(&mut self, pass: PassId, action: &PassAction) -> bool {
        if self.pass_open {
            log::error!("begin_pass: a pass is already open; nested passes are not allowed");
            return false;
        }
        if !pass.is_valid() {
            log::error!("begin_pass: invalid pass id");
            return false;
        }
        self.gfx.begin_pass(pass, action);
        self.open_pass();
        true
    }

    pub fn end_pass(&mut self) {
        if !self.pass_open {
            log::warn!("end_pass without a matching begin");
            return;
        }
        self.gfx.end_pass();
        self.pass_open = false;
    }

    fn open_pass(&mut self) {
        self.pass_open = true;
        // Pipeline and bindings do not carry over into a new pass.
        self.cache = BindCache::default();
    }

    // ── draws ─────────────────────────────────────────────────────────────

    /// Solid quad covering the unit square under `transform`.
    pub fn render_colored_quad(&mut self, color: ColorRgba, transform: &Mat4) {
        let Some((pipeline, quad_buffer)) = self.draw_target(|b| b.colored_pipeline) else {
            return;
        };

        self.bind_pipeline(pipeline);
        self.bind(Bindings {
            vertex_buffer: quad_buffer,
            ..Bindings::default()
        });

        let vs = ColoredQuadVs::new(transform);
        let fs = ColoredQuadFs::new(color);
        self.gfx.apply_uniforms(ShaderStage::Vertex, 0, bytemuck::bytes_of(&vs));
        self.gfx.apply_uniforms(ShaderStage::Fragment, 0, bytemuck::bytes_of(&fs));
        self.gfx.draw(0, 4, 1);
        self.stats.draws += 1;
    }

    /// Quad showing `rect` of `texture`, multiplied by `tint`.
    ///
    /// A zero-sized `rect` shows the whole texture. Textures that do not exist,
    /// have a zero extent or cannot be filtered are skipped with a warning.
    pub fn render_textured_quad(
        &mut self,
        texture: &Texture,
        sampler: SamplerId,
        rect: SourceRect,
        tint: ColorRgba,
        transform: &Mat4,
    ) {
        if !texture.exists {
            log::warn!("render_textured_quad: texture has no GPU image");
            self.stats.skipped += 1;
            return;
        }
        let Some(uv) = rect.uv(texture.width, texture.height) else {
            log::warn!(
                "render_textured_quad: texture has zero extent {}x{}",
                texture.width,
                texture.height
            );
            self.stats.skipped += 1;
            return;
        };
        if !texture.format.is_filterable() || texture.sample_count > 1 {
            log::warn!(
                "render_textured_quad: {:?} texture with {} samples cannot be sampled",
                texture.format,
                texture.sample_count
            );
            self.stats.skipped += 1;
            return;
        }
        if !sampler.is_valid() {
            log::warn!("render_textured_quad: invalid sampler");
            self.stats.skipped += 1;
            return;
        }
        let Some((pipeline, quad_buffer)) = self.draw_target(|b| b.textured_pipeline) else {
            return;
        };

        self.bind_pipeline(pipeline);
        self.bind(Bindings {
            vertex_buffer: quad_buffer,
            fs_image: texture.image,
            fs_sampler: sampler,
        });

        let vs = TexturedQuadVs::new(transform, uv);
        let fs = TexturedQuadFs::new(tint);
        self.gfx.apply_uniforms(ShaderStage::Vertex, 0, bytemuck::bytes_of(&vs));
        self.gfx.apply_uniforms(ShaderStage::Fragment, 0, bytemuck::bytes_of(&fs));
        self.gfx.draw(0, 4, 1);
        self.stats.draws += 1;
    }

    /// Pipeline and quad buffer for a draw, or `None` if the draw must be dropped.
    fn draw_target(
        &mut self,
        pick: impl Fn(&Builtins) -> PipelineId,
    ) -> Option<(PipelineId, BufferId)> {
        let Some(builtins) = &self.builtins else {
            log::warn!("draw after renderer deinit dropped");
            self.stats.skipped += 1;
            return None;
        };
        let target = (pick(builtins), builtins.quad_buffer);
        if !self.pass_open {
            if !self.warned_outside_pass {
                log::warn!("draw outside of a pass dropped; call begin_pass or begin_default_pass");
                self.warned_outside_pass = true;
            }
            self.stats.skipped += 1;
            return None;
        }
        Some(target)
    }

    fn bind_pipeline(&mut self, pipeline: PipelineId) {
        if self.cache.pipeline == pipeline {
            return;
        }
        self.gfx.apply_pipeline(pipeline);
        self.cache.pipeline = pipeline;
        self.stats.pipeline_binds += 1;
    }

    fn bind(&mut self, bindings: Bindings) {
        if self.cache.bindings == bindings {
            return;
        }
        self.gfx.apply_bindings(&bindings);
        self.cache.bindings = bindings;
        self.stats.binding_changes += 1;
    }

    // ── teardown ──────────────────────────────────────────────────────────

    /// Destroys the builtin objects and shuts the backend down. Idempotent.
    pub fn deinit(&mut self) {
        let Some(builtins) = self.builtins.take() else { return };
        if self.pass_open {
            self.gfx.end_pass();
            self.pass_open = false;
        }
        builtins.destroy(self.gfx.as_mut());
        self.gfx.shutdown();
        log::debug!("renderer deinitialized");
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.deinit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Call, ImageDesc, PixelFormat, RecordingBackend, RecordingProbe};

    fn renderer() -> (Renderer, RecordingProbe) {
        let gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let r = Renderer::new(Box::new(gfx)).unwrap();
        probe.clear();
        (r, probe)
    }

    fn texture(r: &mut Renderer, width: u32, height: u32) -> Texture {
        let image = r.gfx_mut().make_image(&ImageDesc {
            width,
            height,
            format: PixelFormat::Rgba8,
            ..Default::default()
        });
        Texture {
            exists: true,
            image,
            width,
            height,
            format: PixelFormat::Rgba8,
            sample_count: 1,
            ..Default::default()
        }
    }

    fn uniforms(probe: &RecordingProbe, stage: ShaderStage) -> Vec<Vec<u8>> {
        probe
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ApplyUniforms { stage: s, data, .. } if s == stage => Some(data),
                _ => None,
            })
            .collect()
    }

    // ── pipeline cache ────────────────────────────────────────────────────

    #[test]
    fn repeated_colored_quads_bind_pipeline_once() {
        let (mut r, probe) = renderer();
        r.begin_render();
        r.begin_default_pass(&PassAction::clear([0.0; 4]), 64, 64);
        for _ in 0..10 {
            r.render_colored_quad(ColorRgba::white(), &Mat4::IDENTITY);
        }
        r.end_pass();
        r.end_render();

        assert_eq!(probe.count(|c| matches!(c, Call::ApplyPipeline(_))), 1);
        assert_eq!(probe.count(|c| matches!(c, Call::Draw { count: 4, .. })), 10);
    }

    #[test]
    fn switching_pipelines_rebinds_each_time() {
        let (mut r, probe) = renderer();
        let tex = texture(&mut r, 8, 8);
        let sampler = r.builtin_sampler(BuiltinSampler::Nearest);
        r.begin_render();
        r.begin_default_pass(&PassAction::load(), 64, 64);
        r.render_colored_quad(ColorRgba::white(), &Mat4::IDENTITY);
        r.render_textured_quad(
            &tex,
            sampler,
            SourceRect::default(),
            ColorRgba::white(),
            &Mat4::IDENTITY,
        );
        r.render_colored_quad(ColorRgba::white(), &Mat4::IDENTITY);
        r.end_pass();
        r.end_render();

        assert_eq!(probe.count(|c| matches!(c, Call::ApplyPipeline(_))), 3);
    }

    #[test]
    fn begin_render_invalidates_cached_pipeline() {
        let (mut r, probe) = renderer();
        for _ in 0..2 {
            r.begin_render();
            r.begin_default_pass(&PassAction::load(), 64, 64);
            r.render_colored_quad(ColorRgba::black(), &Mat4::IDENTITY);
            r.end_pass();
            r.end_render();
        }
        assert_eq!(probe.count(|c| matches!(c, Call::ApplyPipeline(_))), 2);
        assert_eq!(probe.count(|c| matches!(c, Call::Commit)), 2);
    }

    // ── textured quads ────────────────────────────────────────────────────

    #[test]
    fn zero_rect_uploads_full_uv_range() {
        let (mut r, probe) = renderer();
        let tex = texture(&mut r, 32, 16);
        let sampler = r.builtin_sampler(BuiltinSampler::Nearest);
        r.begin_render();
        r.begin_default_pass(&PassAction::load(), 64, 64);
        r.render_textured_quad(
            &tex,
            sampler,
            SourceRect::new(9, 9, 0, 0),
            ColorRgba::white(),
            &Mat4::IDENTITY,
        );
        r.end_pass();
        r.end_render();

        let vs = uniforms(&probe, ShaderStage::Vertex);
        let block: TexturedQuadVs = bytemuck::pod_read_unaligned(&vs[0]);
        assert_eq!(block.uvs, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn tint_reaches_fragment_stage() {
        let (mut r, probe) = renderer();
        let tex = texture(&mut r, 4, 4);
        let sampler = r.builtin_sampler(BuiltinSampler::Bilinear);
        r.begin_render();
        r.begin_default_pass(&PassAction::load(), 64, 64);
        r.render_textured_quad(
            &tex,
            sampler,
            SourceRect::default(),
            ColorRgba::new(0.5, 0.25, 1.0, 1.0),
            &Mat4::IDENTITY,
        );
        r.end_pass();
        r.end_render();

        let fs = uniforms(&probe, ShaderStage::Fragment);
        let block: TexturedQuadFs = bytemuck::pod_read_unaligned(&fs[0]);
        assert_eq!(block.tint, [0.5, 0.25, 1.0, 1.0]);
    }

    #[test]
    fn zero_sized_texture_is_skipped() {
        let (mut r, probe) = renderer();
        let tex = Texture {
            exists: true,
            ..Default::default()
        };
        let sampler = r.builtin_sampler(BuiltinSampler::Nearest);
        r.begin_render();
        r.begin_default_pass(&PassAction::load(), 64, 64);
        r.render_textured_quad(
            &tex,
            sampler,
            SourceRect::default(),
            ColorRgba::white(),
            &Mat4::IDENTITY,
        );
        r.end_pass();
        r.end_render();

        assert_eq!(probe.count(|c| matches!(c, Call::Draw { .. })), 0);
        assert_eq!(r.stats().skipped, 1);
    }

    // ── passes ────────────────────────────────────────────────────────────

    #[test]
    fn nested_pass_is_rejected() {
        let (mut r, probe) = renderer();
        r.begin_render();
        assert!(r.begin_default_pass(&PassAction::load(), 64, 64));
        assert!(!r.begin_default_pass(&PassAction::load(), 64, 64));
        r.end_pass();
        r.end_render();

        assert_eq!(probe.count(|c| matches!(c, Call::BeginDefaultPass { .. })), 1);
        assert_eq!(probe.count(|c| matches!(c, Call::EndPass)), 1);
    }

    #[test]
    fn draw_outside_pass_is_dropped() {
        let (mut r, probe) = renderer();
        r.begin_render();
        r.render_colored_quad(ColorRgba::white(), &Mat4::IDENTITY);
        r.end_render();

        assert_eq!(probe.count(|c| matches!(c, Call::ApplyPipeline(_))), 0);
        assert_eq!(r.stats().skipped, 1);
    }

    #[test]
    fn new_pass_rebinds_pipeline() {
        let (mut r, probe) = renderer();
        r.begin_render();
        for _ in 0..2 {
            r.begin_default_pass(&PassAction::load(), 64, 64);
            r.render_colored_quad(ColorRgba::white(), &Mat4::IDENTITY);
            r.end_pass();
        }
        r.end_render();
        assert_eq!(probe.count(|c| matches!(c, Call::ApplyPipeline(_))), 2);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn deinit_destroys_builtins_in_reverse_creation_order() {
        let gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let mut r = Renderer::new(Box::new(gfx)).unwrap();

        let created: Vec<u32> = probe
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::MakeShader(id) => Some(id.0),
                Call::MakePipeline(id) => Some(id.0),
                Call::MakeBuffer(id) => Some(id.0),
                Call::MakeSampler(id) => Some(id.0),
                _ => None,
            })
            .collect();

        probe.clear();
        r.deinit();

        let destroyed: Vec<u32> = probe
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::DestroyShader(id) => Some(id.0),
                Call::DestroyPipeline(id) => Some(id.0),
                Call::DestroyBuffer(id) => Some(id.0),
                Call::DestroySampler(id) => Some(id.0),
                _ => None,
            })
            .collect();

        let mut reversed = created.clone();
        reversed.reverse();
        assert_eq!(destroyed, reversed);
        assert!(probe.is_shut_down());
        assert_eq!(probe.live_resources(), 0);
    }

    #[test]
    fn deinit_is_idempotent() {
        let (mut r, probe) = renderer();
        r.deinit();
        r.deinit();
        assert_eq!(probe.count(|c| matches!(c, Call::Shutdown)), 1);
    }
}
