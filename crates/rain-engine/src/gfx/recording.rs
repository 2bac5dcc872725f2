use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::types::*;
use super::GfxBackend;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MakeShader(ShaderId),
    MakePipeline(PipelineId),
    MakeBuffer(BufferId),
    MakeImage { id: ImageId, width: u32, height: u32, format: PixelFormat },
    MakeSampler(SamplerId),
    MakePass(PassId),

    DestroyShader(ShaderId),
    DestroyPipeline(PipelineId),
    DestroyBuffer(BufferId),
    DestroyImage(ImageId),
    DestroySampler(SamplerId),
    DestroyPass(PassId),

    BeginDefaultPass { action: PassAction, width: u32, height: u32 },
    BeginPass { pass: PassId, action: PassAction },
    EndPass,

    ApplyPipeline(PipelineId),
    ApplyBindings(Bindings),
    ApplyUniforms { stage: ShaderStage, slot: u32, data: Vec<u8> },
    Draw { base: u32, count: u32, instances: u32 },

    Commit,
    Shutdown,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Kind {
    Shader,
    Pipeline,
    Buffer,
    Image,
    Sampler,
    Pass,
}

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<Call>,
    live: HashSet<(Kind, u32)>,
    next_id: u32,
    pass_open: bool,
    shut_down: bool,
    lost: bool,
}

impl Journal {
    fn create(&mut self, kind: Kind) -> u32 {
        self.next_id += 1;
        self.live.insert((kind, self.next_id));
        self.next_id
    }

    fn release(&mut self, kind: Kind, id: u32) -> bool {
        if id == 0 || !self.live.remove(&(kind, id)) {
            log::warn!("recording backend: destroy of unknown {kind:?} id {id}");
            return false;
        }
        true
    }

    fn is_live(&self, kind: Kind, id: u32) -> bool {
        self.live.contains(&(kind, id))
    }
}

/// Backend that draws nothing and remembers everything.
///
/// Used by tests and headless runs. Ids are never reused, so a stale id stays
/// distinguishable from a live one for the whole run.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    journal: Rc<RefCell<Journal>>,
}

/// Read-only view of a `RecordingBackend` that stays usable after the backend
/// has been boxed and handed to the renderer.
#[derive(Debug, Clone)]
pub struct RecordingProbe {
    journal: Rc<RefCell<Journal>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> RecordingProbe {
        RecordingProbe {
            journal: Rc::clone(&self.journal),
        }
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().calls.push(call);
    }
}

impl RecordingProbe {
    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.journal.borrow().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.journal.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_resources(&self) -> usize {
        self.journal.borrow().live.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.journal.borrow().shut_down
    }

    pub fn clear(&self) {
        self.journal.borrow_mut().calls.clear();
    }

    /// Makes the backend report a lost device from now on.
    pub fn lose_device(&self) {
        self.journal.borrow_mut().lost = true;
    }
}

impl GfxBackend for RecordingBackend {
    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderId {
        if desc.source.is_empty() {
            log::error!("shader '{}' has no source", desc.label);
            return ShaderId::INVALID;
        }
        let id = ShaderId(self.journal.borrow_mut().create(Kind::Shader));
        self.record(Call::MakeShader(id));
        id
    }

    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> PipelineId {
        if !self.journal.borrow().is_live(Kind::Shader, desc.shader.0) {
            log::error!("pipeline '{}' references unknown shader {:?}", desc.label, desc.shader);
            return PipelineId::INVALID;
        }
        let id = PipelineId(self.journal.borrow_mut().create(Kind::Pipeline));
        self.record(Call::MakePipeline(id));
        id
    }

    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferId {
        if desc.data.is_empty() {
            log::error!("buffer '{}' is empty", desc.label);
            return BufferId::INVALID;
        }
        let id = BufferId(self.journal.borrow_mut().create(Kind::Buffer));
        self.record(Call::MakeBuffer(id));
        id
    }

    fn make_image(&mut self, desc: &ImageDesc<'_>) -> ImageId {
        if let Some(reason) = desc.rejection() {
            log::warn!("recording backend: image rejected: {reason}");
            return ImageId::INVALID;
        }
        let id = ImageId(self.journal.borrow_mut().create(Kind::Image));
        self.record(Call::MakeImage {
            id,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        id
    }

    fn make_sampler(&mut self, _desc: &SamplerDesc) -> SamplerId {
        let id = SamplerId(self.journal.borrow_mut().create(Kind::Sampler));
        self.record(Call::MakeSampler(id));
        id
    }

    fn make_pass(&mut self, desc: &PassDesc) -> PassId {
        {
            let j = self.journal.borrow();
            let depth_ok =
                !desc.depth_stencil.is_valid() || j.is_live(Kind::Image, desc.depth_stencil.0);
            if !j.is_live(Kind::Image, desc.color.0) || !depth_ok {
                log::error!("pass references unknown images {desc:?}");
                return PassId::INVALID;
            }
        }
        let id = PassId(self.journal.borrow_mut().create(Kind::Pass));
        self.record(Call::MakePass(id));
        id
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        if self.journal.borrow_mut().release(Kind::Shader, id.0) {
            self.record(Call::DestroyShader(id));
        }
    }

    fn destroy_pipeline(&mut self, id: PipelineId) {
        if self.journal.borrow_mut().release(Kind::Pipeline, id.0) {
            self.record(Call::DestroyPipeline(id));
        }
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if self.journal.borrow_mut().release(Kind::Buffer, id.0) {
            self.record(Call::DestroyBuffer(id));
        }
    }

    fn destroy_image(&mut self, id: ImageId) {
        if self.journal.borrow_mut().release(Kind::Image, id.0) {
            self.record(Call::DestroyImage(id));
        }
    }

    fn destroy_sampler(&mut self, id: SamplerId) {
        if self.journal.borrow_mut().release(Kind::Sampler, id.0) {
            self.record(Call::DestroySampler(id));
        }
    }

    fn destroy_pass(&mut self, id: PassId) {
        if self.journal.borrow_mut().release(Kind::Pass, id.0) {
            self.record(Call::DestroyPass(id));
        }
    }

    fn begin_default_pass(&mut self, action: &PassAction, width: u32, height: u32) {
        self.journal.borrow_mut().pass_open = true;
        self.record(Call::BeginDefaultPass {
            action: *action,
            width,
            height,
        });
    }

    fn begin_pass(&mut self, pass: PassId, action: &PassAction) {
        if !self.journal.borrow().is_live(Kind::Pass, pass.0) {
            log::error!("begin_pass on unknown pass {pass:?}");
            return;
        }
        self.journal.borrow_mut().pass_open = true;
        self.record(Call::BeginPass {
            pass,
            action: *action,
        });
    }

    fn end_pass(&mut self) {
        self.journal.borrow_mut().pass_open = false;
        self.record(Call::EndPass);
    }

    fn apply_pipeline(&mut self, pipeline: PipelineId) {
        self.record(Call::ApplyPipeline(pipeline));
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        self.record(Call::ApplyBindings(*bindings));
    }

    fn apply_uniforms(&mut self, stage: ShaderStage, slot: u32, data: &[u8]) {
        self.record(Call::ApplyUniforms {
            stage,
            slot,
            data: data.to_vec(),
        });
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        if !self.journal.borrow().pass_open {
            log::warn!("draw outside of a pass dropped");
            return;
        }
        self.record(Call::Draw {
            base: base_element,
            count: num_elements,
            instances: num_instances,
        });
    }

    fn commit(&mut self) {
        self.record(Call::Commit);
    }

    fn live_resources(&self) -> usize {
        self.journal.borrow().live.len()
    }

    fn is_lost(&self) -> bool {
        self.journal.borrow().lost
    }

    fn shutdown(&mut self) {
        let mut j = self.journal.borrow_mut();
        if j.shut_down {
            return;
        }
        j.shut_down = true;
        j.live.clear();
        j.calls.push(Call::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(gfx: &mut RecordingBackend) -> ImageId {
        gfx.make_image(&ImageDesc {
            width: 4,
            height: 4,
            format: PixelFormat::Rgba8,
            ..Default::default()
        })
    }

    #[test]
    fn create_and_destroy_balances_live_table() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let a = image(&mut gfx);
        let b = image(&mut gfx);
        assert_eq!(probe.live_resources(), 2);
        gfx.destroy_image(a);
        gfx.destroy_image(b);
        assert_eq!(probe.live_resources(), 0);
    }

    #[test]
    fn double_destroy_is_ignored() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let a = image(&mut gfx);
        gfx.destroy_image(a);
        gfx.destroy_image(a);
        assert_eq!(probe.count(|c| matches!(c, Call::DestroyImage(_))), 1);
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let mut gfx = RecordingBackend::new();
        let id = gfx.make_image(&ImageDesc::default());
        assert!(!id.is_valid());
        assert_eq!(gfx.live_resources(), 0);
    }

    #[test]
    fn unrenderable_render_target_is_rejected() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        let id = gfx.make_image(&ImageDesc {
            width: 64,
            height: 64,
            format: PixelFormat::R8Snorm,
            render_target: true,
            ..Default::default()
        });
        assert!(!id.is_valid());
        assert_eq!(probe.count(|c| matches!(c, Call::MakeImage { .. })), 0);
    }

    #[test]
    fn pass_requires_live_color_image() {
        let mut gfx = RecordingBackend::new();
        let color = image(&mut gfx);
        gfx.destroy_image(color);
        let pass = gfx.make_pass(&PassDesc {
            color,
            depth_stencil: ImageId::INVALID,
        });
        assert!(!pass.is_valid());
    }

    #[test]
    fn draw_outside_pass_is_dropped() {
        let mut gfx = RecordingBackend::new();
        let probe = gfx.probe();
        gfx.draw(0, 4, 1);
        assert_eq!(probe.count(|c| matches!(c, Call::Draw { .. })), 0);
    }
}
