//! Per-frame recording: passes and draws captured between commits, and the
//! uniform arena they index into.

use crate::gfx::{Bindings, BufferId, ImageId, PassAction, PassId, PipelineId, SamplerId};

/// Size reserved for one uniform block. Larger blocks are truncated.
pub(crate) const UNIFORM_SLOT: u64 = 256;

const SLOT_BINDING_SIZE: wgpu::BufferSize = match wgpu::BufferSize::new(UNIFORM_SLOT) {
    Some(size) => size,
    None => unreachable!(),
};

const INITIAL_SLOTS: u64 = 64;

// ── recorded commands ─────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PassTarget {
    Surface,
    Offscreen(PassId),
}

#[derive(Debug)]
pub(crate) struct RecordedPass {
    pub target: PassTarget,
    pub action: PassAction,
    pub draws: Vec<RecordedDraw>,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct RecordedDraw {
    pub pipeline: PipelineId,
    pub vertex_buffer: BufferId,
    pub texture: Option<(ImageId, SamplerId)>,
    pub vs_offset: u32,
    pub fs_offset: u32,
    pub base: u32,
    pub count: u32,
    pub instances: u32,
}

/// State applied since the pass began; snapshotted into each draw.
#[derive(Debug, Default, Copy, Clone)]
pub(crate) struct DrawState {
    pub pipeline: PipelineId,
    pub bindings: Bindings,
    pub vs_offset: u32,
    pub fs_offset: u32,
}

impl DrawState {
    pub fn snapshot(&self, base: u32, count: u32, instances: u32) -> RecordedDraw {
        let b = self.bindings;
        let texture = (b.fs_image.is_valid() && b.fs_sampler.is_valid())
            .then_some((b.fs_image, b.fs_sampler));
        RecordedDraw {
            pipeline: self.pipeline,
            vertex_buffer: b.vertex_buffer,
            texture,
            vs_offset: self.vs_offset,
            fs_offset: self.fs_offset,
            base,
            count,
            instances,
        }
    }
}

// ── uniform arena ─────────────────────────────────────────────────────────

/// One dynamic-offset uniform buffer shared by every draw of a frame.
///
/// Slot 0 is always zeroed so a draw that never uploaded a block still binds
/// valid memory.
pub(crate) struct UniformArena {
    stride: u64,
    staging: Vec<u8>,
    buffer: wgpu::Buffer,
    capacity: u64,
    bind_group: wgpu::BindGroup,
}

impl UniformArena {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, alignment: u32) -> Self {
        let align = u64::from(alignment.max(1));
        let stride = UNIFORM_SLOT.max(align).next_multiple_of(align);
        let capacity = stride * INITIAL_SLOTS;
        let (buffer, bind_group) = Self::allocate(device, layout, capacity);

        let mut arena = Self {
            stride,
            staging: Vec::with_capacity(capacity as usize),
            buffer,
            capacity,
            bind_group,
        };
        arena.reset();
        arena
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rain uniform arena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let slot = |binding| wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: Some(SLOT_BINDING_SIZE),
            }),
        };

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain uniform arena bind group"),
            layout,
            entries: &[slot(0), slot(1)],
        });

        (buffer, bind_group)
    }

    /// Drops every block of the previous frame.
    pub fn reset(&mut self) {
        self.staging.clear();
        self.staging.resize(self.stride as usize, 0);
    }

    /// Appends one block and returns its dynamic offset.
    pub fn push(&mut self, data: &[u8]) -> u32 {
        let offset = self.staging.len();
        let len = if data.len() as u64 > UNIFORM_SLOT {
            log::warn!(
                "uniform block of {} bytes truncated to {UNIFORM_SLOT}",
                data.len()
            );
            UNIFORM_SLOT as usize
        } else {
            data.len()
        };
        self.staging.extend_from_slice(&data[..len]);
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    /// Copies the frame's blocks to the GPU, growing the buffer first if needed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) {
        let needed = self.staging.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = Self::allocate(device, layout, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
            log::debug!("uniform arena grown to {capacity} bytes");
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
