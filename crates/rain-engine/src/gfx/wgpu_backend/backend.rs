use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::gfx::*;

use super::convert;
use super::frame::{DrawState, PassTarget, RecordedPass, UniformArena};
use super::surface::{Acquired, WindowSurface};
use super::{GpuInit, SurfaceErrorAction};

// ── id tables ─────────────────────────────────────────────────────────────

struct Table<T> {
    entries: HashMap<u32, T>,
    next: u32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next: 0,
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, value: T) -> u32 {
        self.next = self.next.wrapping_add(1).max(1);
        self.entries.insert(self.next, value);
        self.next
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.entries.get(&id)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        self.entries.remove(&id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

struct ShaderEntry {
    label: String,
    module: wgpu::ShaderModule,
    textured: bool,
}

/// Attachment formats a pipeline variant is built for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct TargetKey {
    color: wgpu::TextureFormat,
    depth: Option<wgpu::TextureFormat>,
    samples: u32,
}

struct PipelineEntry {
    label: String,
    shader: ShaderId,
    textured: bool,
    primitive: PrimitiveTopology,
    blend: Option<BlendState>,
    variants: HashMap<TargetKey, wgpu::RenderPipeline>,
}

struct ImageEntry {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: PixelFormat,
    wgpu_format: wgpu::TextureFormat,
    render_target: bool,
    samples: u32,
    size: (u32, u32),
}

struct PassEntry {
    color: ImageId,
    depth_stencil: ImageId,
}

struct DepthBuffer {
    size: (u32, u32),
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct Layouts {
    uniforms: wgpu::BindGroupLayout,
    texture: wgpu::BindGroupLayout,
    colored: wgpu::PipelineLayout,
    textured: wgpu::PipelineLayout,
}

const QUAD_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

// ── backend ───────────────────────────────────────────────────────────────

/// `GfxBackend` over wgpu, presenting to a winit window.
///
/// Passes are recorded between commits and replayed into one command encoder
/// at `commit`. Uniform blocks go to a per-frame arena addressed by dynamic
/// offsets, so every draw keeps the values it was issued with.
pub struct WgpuBackend {
    surface: WindowSurface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth: Option<DepthBuffer>,

    layouts: Layouts,
    uniforms: UniformArena,

    shaders: Table<ShaderEntry>,
    pipelines: Table<PipelineEntry>,
    buffers: Table<wgpu::Buffer>,
    images: Table<ImageEntry>,
    samplers: Table<wgpu::Sampler>,
    passes: Table<PassEntry>,
    texture_groups: HashMap<(ImageId, SamplerId), wgpu::BindGroup>,

    recorded: Vec<RecordedPass>,
    open: Option<RecordedPass>,
    state: DrawState,

    fatal: bool,
    shut_down: bool,
}

impl WgpuBackend {
    /// Creates a backend rendering into `window`.
    ///
    /// Adapter and device acquisition are asynchronous under wgpu; this blocks on them.
    pub fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new_async(window, init))
    }

    async fn new_async(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let inner = window.inner_size();
        anyhow::ensure!(inner.width > 0 && inner.height > 0, "window has zero size");
        let size = (inner.width, inner.height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("rain-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        // Uncaptured validation errors go to the log under `gfx`.
        device.on_uncaptured_error(Arc::new(|err: wgpu::Error| {
            log::error!(target: "gfx", "wgpu: {err}");
        }));

        let surface = WindowSurface::configure(surface, &adapter, &device, size, &init)?;

        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            surface.format(),
            size.0,
            size.1
        );

        let layouts = create_layouts(&device);
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let uniforms = UniformArena::new(&device, &layouts.uniforms, alignment);

        Ok(Self {
            surface,
            device,
            queue,
            depth: None,
            layouts,
            uniforms,
            shaders: Table::default(),
            pipelines: Table::default(),
            buffers: Table::default(),
            images: Table::default(),
            samplers: Table::default(),
            passes: Table::default(),
            texture_groups: HashMap::new(),
            recorded: Vec::new(),
            open: None,
            state: DrawState::default(),
            fatal: false,
            shut_down: false,
        })
    }

    // ── commit helpers ────────────────────────────────────────────────────

    fn target_key(&self, target: PassTarget) -> Option<TargetKey> {
        match target {
            PassTarget::Surface => Some(TargetKey {
                color: self.surface.format(),
                depth: Some(convert::DEFAULT_DEPTH_FORMAT),
                samples: 1,
            }),
            PassTarget::Offscreen(id) => {
                let pass = self.passes.get(id.0)?;
                let color = self.images.get(pass.color.0)?;
                let depth = match pass.depth_stencil.is_valid() {
                    true => Some(self.images.get(pass.depth_stencil.0)?.wgpu_format),
                    false => None,
                };
                Some(TargetKey {
                    color: color.wgpu_format,
                    depth,
                    samples: color.samples,
                })
            }
        }
    }

    fn offscreen_views(
        &self,
        id: PassId,
    ) -> Option<(&wgpu::TextureView, Option<&wgpu::TextureView>)> {
        let pass = self.passes.get(id.0)?;
        let color = &self.images.get(pass.color.0)?.view;
        let depth = match pass.depth_stencil.is_valid() {
            true => Some(&self.images.get(pass.depth_stencil.0)?.view),
            false => None,
        };
        Some((color, depth))
    }

    fn ensure_variant(&mut self, id: PipelineId, key: TargetKey) {
        let Some(entry) = self.pipelines.get(id.0) else { return };
        if entry.variants.contains_key(&key) {
            return;
        }
        let Some(shader) = self.shaders.get(entry.shader.0) else {
            log::error!("pipeline '{}': shader {:?} was destroyed", entry.label, entry.shader);
            return;
        };

        let layout = match entry.textured {
            true => &self.layouts.textured,
            false => &self.layouts.colored,
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&entry.label),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRS,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.color,
                    blend: entry.blend.map(convert::blend_state),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: convert::topology(entry.primitive),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            // Quads are painter-ordered; depth is attached but never tested.
            depth_stencil: key.depth.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: key.samples,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },

            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline variant '{}' for {:?}", entry.label, key);
        if let Some(entry) = self.pipelines.get_mut(id.0) {
            entry.variants.insert(key, pipeline);
        }
    }

    fn ensure_texture_group(&mut self, image: ImageId, sampler: SamplerId) {
        if self.texture_groups.contains_key(&(image, sampler)) {
            return;
        }
        let (Some(img), Some(smp)) = (self.images.get(image.0), self.samplers.get(sampler.0)) else {
            log::warn!("draw references destroyed image {image:?} or sampler {sampler:?}");
            return;
        };
        if img.samples > 1 || !img.format.is_filterable() {
            log::warn!("image {image:?} ({:?}) cannot be sampled by the quad shader", img.format);
            return;
        }

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("rain texture bind group"),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&img.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(smp),
                },
            ],
        });
        self.texture_groups.insert((image, sampler), group);
    }

    fn ensure_depth_buffer(&mut self) {
        let size = self.surface.extent();
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("rain default depth"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::DEFAULT_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthBuffer {
            size,
            _texture: texture,
            view,
        });
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &RecordedPass,
        key: TargetKey,
        color_view: &wgpu::TextureView,
        depth_view: Option<&wgpu::TextureView>,
    ) {
        let color_load = match pass.action.color {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c[0]),
                g: f64::from(c[1]),
                b: f64::from(c[2]),
                a: f64::from(c[3]),
            }),
            None => wgpu::LoadOp::Load,
        };

        let depth_attachment = depth_view.map(|view| {
            let clearing = pass.action.depth.is_some();
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: match pass.action.depth {
                        Some(d) => wgpu::LoadOp::Clear(d),
                        None => wgpu::LoadOp::Load,
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: key.depth.filter(|f| convert::has_stencil(*f)).map(|_| {
                    wgpu::Operations {
                        load: match clearing {
                            true => wgpu::LoadOp::Clear(0),
                            false => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    }
                }),
            }
        });

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("rain pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut bound: Option<PipelineId> = None;
        for draw in &pass.draws {
            let Some(entry) = self.pipelines.get(draw.pipeline.0) else { continue };
            let Some(pipeline) = entry.variants.get(&key) else { continue };
            let Some(vertex_buffer) = self.buffers.get(draw.vertex_buffer.0) else { continue };

            let texture_group = match entry.textured {
                true => match draw.texture.and_then(|t| self.texture_groups.get(&t)) {
                    Some(group) => Some(group),
                    None => continue,
                },
                false => None,
            };

            if bound != Some(draw.pipeline) {
                rpass.set_pipeline(pipeline);
                bound = Some(draw.pipeline);
            }
            rpass.set_bind_group(0, self.uniforms.bind_group(), &[draw.vs_offset, draw.fs_offset]);
            if let Some(group) = texture_group {
                rpass.set_bind_group(1, group, &[]);
            }
            rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
            rpass.draw(draw.base..draw.base + draw.count, 0..draw.instances);
        }
    }

    fn discard_frame(&mut self) {
        self.recorded.clear();
        self.open = None;
        self.uniforms.reset();
    }
}

fn create_layouts(device: &wgpu::Device) -> Layouts {
    let uniform_entry = |binding, visibility| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: None,
        },
        count: None,
    };

    let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("rain uniforms bgl"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX),
            uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
        ],
    });

    let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("rain texture bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let colored = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("rain colored pipeline layout"),
        bind_group_layouts: &[&uniforms],
        immediate_size: 0,
    });

    let textured = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("rain textured pipeline layout"),
        bind_group_layouts: &[&uniforms, &texture],
        immediate_size: 0,
    });

    Layouts {
        uniforms,
        texture,
        colored,
        textured,
    }
}

fn image_usage(desc: &ImageDesc<'_>, samples: u32) -> wgpu::TextureUsages {
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING;
    if desc.render_target {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if samples == 1 && !desc.format.is_depth() {
        usage |= wgpu::TextureUsages::COPY_DST;
    }
    usage
}

impl GfxBackend for WgpuBackend {
    fn make_shader(&mut self, desc: &ShaderDesc<'_>) -> ShaderId {
        if desc.source.is_empty() {
            log::error!("shader '{}' has no source", desc.label);
            return ShaderId::INVALID;
        }
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });
        ShaderId(self.shaders.insert(ShaderEntry {
            label: desc.label.to_string(),
            module,
            textured: desc.textured,
        }))
    }

    fn make_pipeline(&mut self, desc: &PipelineDesc<'_>) -> PipelineId {
        let Some(shader) = self.shaders.get(desc.shader.0) else {
            log::error!("pipeline '{}' references unknown shader {:?}", desc.label, desc.shader);
            return PipelineId::INVALID;
        };
        log::trace!("pipeline '{}' over shader '{}'", desc.label, shader.label);
        let textured = shader.textured;
        PipelineId(self.pipelines.insert(PipelineEntry {
            label: desc.label.to_string(),
            shader: desc.shader,
            textured,
            primitive: desc.primitive,
            blend: desc.blend,
            variants: HashMap::new(),
        }))
    }

    fn make_buffer(&mut self, desc: &BufferDesc<'_>) -> BufferId {
        if desc.data.is_empty() {
            log::error!("buffer '{}' is empty", desc.label);
            return BufferId::INVALID;
        }
        let mut usage = wgpu::BufferUsages::VERTEX;
        if matches!(desc.usage, Usage::Dynamic | Usage::Stream) {
            usage |= wgpu::BufferUsages::COPY_DST;
        }
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(desc.label),
            contents: desc.data,
            usage,
        });
        BufferId(self.buffers.insert(buffer))
    }

    fn make_image(&mut self, desc: &ImageDesc<'_>) -> ImageId {
        if let Some(reason) = desc.rejection() {
            log::warn!("image not created: {reason}");
            return ImageId::INVALID;
        }
        let (width, height) = (desc.width, desc.height);
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            log::warn!("image extent {width}x{height} exceeds {max}; not created");
            return ImageId::INVALID;
        }
        let Some(wgpu_format) = convert::texture_format(desc.format) else {
            log::warn!("pixel format {:?} is not supported", desc.format);
            return ImageId::INVALID;
        };

        let samples = desc.resolved_sample_count();
        if samples != desc.sample_count.max(1) {
            log::warn!("sample count {} unsupported here; using {samples}", desc.sample_count);
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("rain image"),
            size: extent,
            mip_level_count: 1,
            sample_count: samples,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format,
            usage: image_usage(desc, samples),
            view_formats: &[],
        });

        if !desc.data.is_empty() {
            let bpp = desc.format.bytes_per_pixel().unwrap_or(0);
            let expected = (width as usize) * (height as usize) * bpp as usize;
            if bpp == 0 || samples > 1 || desc.data.len() != expected {
                log::warn!(
                    "{} bytes of image data do not fit {width}x{height} {:?}; left uninitialized",
                    desc.data.len(),
                    desc.format
                );
            } else {
                self.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        aspect: wgpu::TextureAspect::All,
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                    },
                    desc.data,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bpp * width),
                        rows_per_image: Some(height),
                    },
                    extent,
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        ImageId(self.images.insert(ImageEntry {
            _texture: texture,
            view,
            format: desc.format,
            wgpu_format,
            render_target: desc.render_target,
            samples,
            size: (width, height),
        }))
    }

    fn make_sampler(&mut self, desc: &SamplerDesc) -> SamplerId {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("rain sampler"),
            address_mode_u: convert::address_mode(desc.wrap_u),
            address_mode_v: convert::address_mode(desc.wrap_v),
            mag_filter: convert::filter(desc.mag_filter),
            min_filter: convert::filter(desc.min_filter),
            ..Default::default()
        });
        SamplerId(self.samplers.insert(sampler))
    }

    fn make_pass(&mut self, desc: &PassDesc) -> PassId {
        let Some(color) = self.images.get(desc.color.0) else {
            log::error!("pass color image {:?} does not exist", desc.color);
            return PassId::INVALID;
        };
        if !color.render_target || color.format.is_depth() {
            log::error!("pass color image {:?} is not a color render target", desc.color);
            return PassId::INVALID;
        }
        if desc.depth_stencil.is_valid() {
            let Some(depth) = self.images.get(desc.depth_stencil.0) else {
                log::error!("pass depth image {:?} does not exist", desc.depth_stencil);
                return PassId::INVALID;
            };
            if !depth.render_target || !depth.format.is_depth() {
                log::error!(
                    "pass depth image {:?} is not a depth render target",
                    desc.depth_stencil
                );
                return PassId::INVALID;
            }
            if depth.size != color.size || depth.samples != color.samples {
                log::error!("pass attachments differ in size or sample count");
                return PassId::INVALID;
            }
        }
        PassId(self.passes.insert(PassEntry {
            color: desc.color,
            depth_stencil: desc.depth_stencil,
        }))
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        if self.shaders.remove(id.0).is_none() {
            log::warn!("destroy of unknown shader {id:?}");
        }
    }

    fn destroy_pipeline(&mut self, id: PipelineId) {
        if self.pipelines.remove(id.0).is_none() {
            log::warn!("destroy of unknown pipeline {id:?}");
        }
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        match self.buffers.remove(id.0) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("destroy of unknown buffer {id:?}"),
        }
    }

    fn destroy_image(&mut self, id: ImageId) {
        if self.images.remove(id.0).is_none() {
            log::warn!("destroy of unknown image {id:?}");
            return;
        }
        self.texture_groups.retain(|(image, _), _| *image != id);
    }

    fn destroy_sampler(&mut self, id: SamplerId) {
        if self.samplers.remove(id.0).is_none() {
            log::warn!("destroy of unknown sampler {id:?}");
            return;
        }
        self.texture_groups.retain(|(_, sampler), _| *sampler != id);
    }

    fn destroy_pass(&mut self, id: PassId) {
        if self.passes.remove(id.0).is_none() {
            log::warn!("destroy of unknown pass {id:?}");
        }
    }

    fn begin_default_pass(&mut self, action: &PassAction, width: u32, height: u32) {
        if self.open.is_some() {
            log::error!("begin_default_pass while another pass is open");
            return;
        }
        self.surface.resize(&self.device, (width, height));
        self.state = DrawState::default();
        self.open = Some(RecordedPass {
            target: PassTarget::Surface,
            action: *action,
            draws: Vec::new(),
        });
    }

    fn begin_pass(&mut self, pass: PassId, action: &PassAction) {
        if self.open.is_some() {
            log::error!("begin_pass while another pass is open");
            return;
        }
        if self.passes.get(pass.0).is_none() {
            log::error!("begin_pass on unknown pass {pass:?}");
            return;
        }
        self.state = DrawState::default();
        self.open = Some(RecordedPass {
            target: PassTarget::Offscreen(pass),
            action: *action,
            draws: Vec::new(),
        });
    }

    fn end_pass(&mut self) {
        match self.open.take() {
            Some(pass) => self.recorded.push(pass),
            None => log::warn!("end_pass without an open pass"),
        }
    }

    fn apply_pipeline(&mut self, pipeline: PipelineId) {
        self.state.pipeline = pipeline;
    }

    fn apply_bindings(&mut self, bindings: &Bindings) {
        self.state.bindings = *bindings;
    }

    fn apply_uniforms(&mut self, stage: ShaderStage, slot: u32, data: &[u8]) {
        if self.open.is_none() {
            log::warn!("apply_uniforms outside of a pass ignored");
            return;
        }
        if slot != 0 {
            log::warn!("uniform slot {slot} unsupported; only slot 0 exists");
            return;
        }
        let offset = self.uniforms.push(data);
        match stage {
            ShaderStage::Vertex => self.state.vs_offset = offset,
            ShaderStage::Fragment => self.state.fs_offset = offset,
        }
    }

    fn draw(&mut self, base_element: u32, num_elements: u32, num_instances: u32) {
        let draw = self.state.snapshot(base_element, num_elements, num_instances);
        match self.open.as_mut() {
            Some(pass) => pass.draws.push(draw),
            None => log::warn!("draw outside of a pass dropped"),
        }
    }

    fn commit(&mut self) {
        if self.shut_down || self.fatal {
            self.discard_frame();
            return;
        }
        if let Some(pass) = self.open.take() {
            log::warn!("commit with an open pass; closing it");
            self.recorded.push(pass);
        }

        let passes = std::mem::take(&mut self.recorded);

        // Everything that needs `&mut self` happens before encoding.
        let mut keys = Vec::with_capacity(passes.len());
        for pass in &passes {
            let key = self.target_key(pass.target);
            if let Some(key) = key {
                for draw in &pass.draws {
                    self.ensure_variant(draw.pipeline, key);
                    if let Some((image, sampler)) = draw.texture {
                        self.ensure_texture_group(image, sampler);
                    }
                }
            } else {
                log::error!("pass {:?} lost an attachment; skipped", pass.target);
            }
            keys.push(key);
        }
        self.uniforms.upload(&self.device, &self.queue, &self.layouts.uniforms);

        let wants_surface = passes.iter().any(|p| p.target == PassTarget::Surface);
        let frame = match wants_surface && self.surface.is_presentable() {
            true => match self.surface.acquire(&self.device) {
                Acquired::Frame(frame) => Some(frame),
                Acquired::Skipped(SurfaceErrorAction::Fatal) => {
                    log::error!("surface out of memory; rendering stopped");
                    self.fatal = true;
                    self.uniforms.reset();
                    return;
                }
                Acquired::Skipped(action) => {
                    log::debug!("surface frame skipped ({action:?})");
                    None
                }
            },
            false => None,
        };
        if frame.is_some() {
            self.ensure_depth_buffer();
        }
        let surface_view = frame
            .as_ref()
            .map(|f| f.texture.create_view(&wgpu::TextureViewDescriptor::default()));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("rain frame encoder"),
            });

        for (pass, key) in passes.iter().zip(&keys) {
            let Some(key) = *key else { continue };
            let views = match pass.target {
                PassTarget::Surface => surface_view
                    .as_ref()
                    .map(|v| (v, self.depth.as_ref().map(|d| &d.view))),
                PassTarget::Offscreen(id) => self.offscreen_views(id),
            };
            let Some((color, depth)) = views else { continue };
            self.encode_pass(&mut encoder, pass, key, color, depth);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(surface_view);
        if let Some(frame) = frame {
            frame.present();
        }
        self.uniforms.reset();
    }

    fn live_resources(&self) -> usize {
        self.shaders.len()
            + self.pipelines.len()
            + self.buffers.len()
            + self.images.len()
            + self.samplers.len()
            + self.passes.len()
    }

    /// Set after an out-of-memory surface error; every later frame is dropped.
    fn is_lost(&self) -> bool {
        self.fatal
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let leaked = self.live_resources();
        if leaked > 0 {
            log::warn!("gpu shutdown with {leaked} objects still alive");
        }
        self.discard_frame();
        self.texture_groups.clear();
        self.passes.clear();
        self.samplers.clear();
        self.images.clear();
        self.buffers.clear();
        self.pipelines.clear();
        self.shaders.clear();
        self.depth = None;
        self.shut_down = true;
        log::debug!("gpu backend shut down");
    }
}
