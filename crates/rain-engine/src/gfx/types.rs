//! Descriptors and ids shared by every `GfxBackend`.

macro_rules! gfx_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: Self = Self(0);

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }
    };
}

gfx_id!(
    /// Compiled shader pair (vertex + fragment).
    ShaderId
);
gfx_id!(
    /// Render pipeline.
    PipelineId
);
gfx_id!(
    /// Vertex buffer.
    BufferId
);
gfx_id!(
    /// 2D image (texture or render target).
    ImageId
);
gfx_id!(SamplerId);
gfx_id!(
    /// Offscreen pass: a color attachment plus an optional depth/stencil attachment.
    PassId
);

// ── pixel formats ─────────────────────────────────────────────────────────

/// Pixel formats, numbered as the scripting side sends them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    #[default]
    Default = 0,
    None = 1,
    R8 = 2,
    R8Snorm = 3,
    R8Uint = 4,
    R8Sint = 5,
    R16 = 6,
    R16Snorm = 7,
    R16Uint = 8,
    R16Sint = 9,
    R16Float = 10,
    Rg8 = 11,
    Rg8Snorm = 12,
    Rg8Uint = 13,
    Rg8Sint = 14,
    R32Uint = 15,
    R32Sint = 16,
    R32Float = 17,
    Rg16 = 18,
    Rg16Snorm = 19,
    Rg16Uint = 20,
    Rg16Sint = 21,
    Rg16Float = 22,
    Rgba8 = 23,
    Srgb8A8 = 24,
    Rgba8Snorm = 25,
    Rgba8Uint = 26,
    Rgba8Sint = 27,
    Bgra8 = 28,
    Rgb10A2 = 29,
    Rg11B10Float = 30,
    Rg32Uint = 31,
    Rg32Sint = 32,
    Rg32Float = 33,
    Rgba16 = 34,
    Rgba16Snorm = 35,
    Rgba16Uint = 36,
    Rgba16Sint = 37,
    Rgba16Float = 38,
    Rgba32Uint = 39,
    Rgba32Sint = 40,
    Rgba32Float = 41,
    Depth = 42,
    DepthStencil = 43,
}

impl PixelFormat {
    const ALL: [PixelFormat; 44] = {
        use PixelFormat::*;
        [
            Default, None, R8, R8Snorm, R8Uint, R8Sint, R16, R16Snorm, R16Uint, R16Sint,
            R16Float, Rg8, Rg8Snorm, Rg8Uint, Rg8Sint, R32Uint, R32Sint, R32Float, Rg16,
            Rg16Snorm, Rg16Uint, Rg16Sint, Rg16Float, Rgba8, Srgb8A8, Rgba8Snorm, Rgba8Uint,
            Rgba8Sint, Bgra8, Rgb10A2, Rg11B10Float, Rg32Uint, Rg32Sint, Rg32Float, Rgba16,
            Rgba16Snorm, Rgba16Uint, Rgba16Sint, Rgba16Float, Rgba32Uint, Rgba32Sint,
            Rgba32Float, Depth, DepthStencil,
        ]
    };

    /// Maps a script-side format code.
    ///
    /// Codes past `DepthStencil` name block-compressed formats, which are not
    /// supported; they return `None` like any unknown code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Format for a decoded image with the given number of bytes per pixel.
    pub fn for_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8),
            2 => Some(Self::Rg8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth | Self::DepthStencil)
    }

    #[inline]
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::DepthStencil)
    }

    /// Whether a quad shader can sample this format through a filtering sampler.
    pub const fn is_filterable(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            Default
                | R8
                | R8Snorm
                | R16Float
                | Rg8
                | Rg8Snorm
                | Rg16Float
                | Rgba8
                | Srgb8A8
                | Rgba8Snorm
                | Bgra8
                | Rgb10A2
                | Rg11B10Float
                | Rgba16Float
        )
    }

    /// Whether a color image of this format can be a blended render attachment
    /// on a device without optional features.
    ///
    /// Snorm and `Rg11B10Float` attachments need adapter features the engine
    /// never requests.
    pub const fn is_color_renderable(self) -> bool {
        use PixelFormat::*;
        self.is_filterable() && !matches!(self, R8Snorm | Rg8Snorm | Rgba8Snorm | Rg11B10Float)
    }

    /// Bytes per texel for uncompressed color formats; `None` for depth and `None`.
    pub const fn bytes_per_pixel(self) -> Option<u32> {
        use PixelFormat::*;
        match self {
            R8 | R8Snorm | R8Uint | R8Sint => Some(1),
            R16 | R16Snorm | R16Uint | R16Sint | R16Float | Rg8 | Rg8Snorm | Rg8Uint
            | Rg8Sint => Some(2),
            R32Uint | R32Sint | R32Float | Rg16 | Rg16Snorm | Rg16Uint | Rg16Sint
            | Rg16Float | Default | Rgba8 | Srgb8A8 | Rgba8Snorm | Rgba8Uint | Rgba8Sint
            | Bgra8 | Rgb10A2 | Rg11B10Float => Some(4),
            Rg32Uint | Rg32Sint | Rg32Float | Rgba16 | Rgba16Snorm | Rgba16Uint
            | Rgba16Sint | Rgba16Float => Some(8),
            Rgba32Uint | Rgba32Sint | Rgba32Float => Some(16),
            None | Depth | DepthStencil => Option::None,
        }
    }
}

/// How often the contents of a GPU object are expected to change.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Usage {
    #[default]
    Default = 0,
    Immutable = 1,
    Dynamic = 2,
    Stream = 3,
}

impl Usage {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Default),
            1 => Some(Self::Immutable),
            2 => Some(Self::Dynamic),
            3 => Some(Self::Stream),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

// ── descriptors ───────────────────────────────────────────────────────────

/// WGSL shader pair with its uniform block sizes.
///
/// Entry points are `vs_main` and `fs_main`. Uniform blocks live in group 0
/// (binding 0 = vertex, binding 1 = fragment); a `textured` shader also reads
/// a texture and sampler from group 1.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub label: &'a str,
    pub source: &'a str,
    pub vs_uniform_size: u32,
    pub fs_uniform_size: u32,
    pub textured: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Separate color and alpha blend factors, additive operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendState {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendState {
    /// Straight alpha for color; destination alpha is preserved.
    pub const ALPHA: Self = Self {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::Zero,
        dst_alpha: BlendFactor::One,
    };
}

/// Pipeline over a single vertex buffer of `float2` positions.
///
/// Attachment formats come from the pass the pipeline is used in.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub shader: ShaderId,
    pub primitive: PrimitiveTopology,
    pub blend: Option<BlendState>,
}

#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub usage: Usage,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, Default)]
pub struct ImageDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub usage: Usage,
    pub render_target: bool,
    pub sample_count: u32,
    /// Tightly packed rows, first row first. Empty for uninitialized images.
    pub data: &'a [u8],
}

impl ImageDesc<'_> {
    /// Sample count the image is actually created with: 4 for multisampled
    /// render targets, 1 for everything else.
    pub const fn resolved_sample_count(&self) -> u32 {
        match self.sample_count {
            4 if self.render_target => 4,
            _ => 1,
        }
    }

    /// Why a backend must refuse this image, if it must.
    pub fn rejection(&self) -> Option<String> {
        if self.width == 0 || self.height == 0 {
            return Some(format!("zero extent {}x{}", self.width, self.height));
        }
        if self.render_target && !self.format.is_depth() && !self.format.is_color_renderable() {
            return Some(format!("{:?} cannot be a color render target", self.format));
        }
        None
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SamplerDesc {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_u: Wrap,
    pub wrap_v: Wrap,
}

impl SamplerDesc {
    pub const fn uniform(filter: Filter) -> Self {
        Self {
            min_filter: filter,
            mag_filter: filter,
            wrap_u: Wrap::Repeat,
            wrap_v: Wrap::Repeat,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PassDesc {
    pub color: ImageId,
    pub depth_stencil: ImageId,
}

/// What to do with the attachments at the start of a pass.
///
/// `None` keeps the previous contents.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PassAction {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
}

impl PassAction {
    /// Clears color to `color` and depth to 1.0.
    pub const fn clear(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }

    pub const fn load() -> Self {
        Self {
            color: None,
            depth: None,
        }
    }
}

/// Resource bindings for the next draw.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pub vertex_buffer: BufferId,
    pub fs_image: ImageId,
    pub fs_sampler: SamplerId,
}
