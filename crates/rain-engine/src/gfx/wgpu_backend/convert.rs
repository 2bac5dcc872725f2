//! Mapping of backend-neutral descriptors onto wgpu types.

use crate::gfx::{BlendFactor, BlendState, Filter, PixelFormat, PrimitiveTopology, Wrap};

/// Texture format for a pixel format code, or `None` when this device
/// configuration cannot create it.
///
/// The 16-bit normalized formats need an optional wgpu feature and are
/// reported as unsupported.
pub(crate) fn texture_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as T;
    let f = match format {
        PixelFormat::Default => T::Rgba8Unorm,
        PixelFormat::None => return None,
        PixelFormat::R8 => T::R8Unorm,
        PixelFormat::R8Snorm => T::R8Snorm,
        PixelFormat::R8Uint => T::R8Uint,
        PixelFormat::R8Sint => T::R8Sint,
        PixelFormat::R16 | PixelFormat::R16Snorm => return None,
        PixelFormat::R16Uint => T::R16Uint,
        PixelFormat::R16Sint => T::R16Sint,
        PixelFormat::R16Float => T::R16Float,
        PixelFormat::Rg8 => T::Rg8Unorm,
        PixelFormat::Rg8Snorm => T::Rg8Snorm,
        PixelFormat::Rg8Uint => T::Rg8Uint,
        PixelFormat::Rg8Sint => T::Rg8Sint,
        PixelFormat::R32Uint => T::R32Uint,
        PixelFormat::R32Sint => T::R32Sint,
        PixelFormat::R32Float => T::R32Float,
        PixelFormat::Rg16 | PixelFormat::Rg16Snorm => return None,
        PixelFormat::Rg16Uint => T::Rg16Uint,
        PixelFormat::Rg16Sint => T::Rg16Sint,
        PixelFormat::Rg16Float => T::Rg16Float,
        PixelFormat::Rgba8 => T::Rgba8Unorm,
        PixelFormat::Srgb8A8 => T::Rgba8UnormSrgb,
        PixelFormat::Rgba8Snorm => T::Rgba8Snorm,
        PixelFormat::Rgba8Uint => T::Rgba8Uint,
        PixelFormat::Rgba8Sint => T::Rgba8Sint,
        PixelFormat::Bgra8 => T::Bgra8Unorm,
        PixelFormat::Rgb10A2 => T::Rgb10a2Unorm,
        PixelFormat::Rg11B10Float => T::Rg11b10Ufloat,
        PixelFormat::Rg32Uint => T::Rg32Uint,
        PixelFormat::Rg32Sint => T::Rg32Sint,
        PixelFormat::Rg32Float => T::Rg32Float,
        PixelFormat::Rgba16 | PixelFormat::Rgba16Snorm => return None,
        PixelFormat::Rgba16Uint => T::Rgba16Uint,
        PixelFormat::Rgba16Sint => T::Rgba16Sint,
        PixelFormat::Rgba16Float => T::Rgba16Float,
        PixelFormat::Rgba32Uint => T::Rgba32Uint,
        PixelFormat::Rgba32Sint => T::Rgba32Sint,
        PixelFormat::Rgba32Float => T::Rgba32Float,
        PixelFormat::Depth => T::Depth32Float,
        PixelFormat::DepthStencil => T::Depth24PlusStencil8,
    };
    Some(f)
}

/// Depth/stencil format of the engine-owned default-pass depth buffer.
pub(crate) const DEFAULT_DEPTH_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Depth24PlusStencil8;

pub(crate) fn has_stencil(format: wgpu::TextureFormat) -> bool {
    matches!(
        format,
        wgpu::TextureFormat::Depth24PlusStencil8
            | wgpu::TextureFormat::Depth32FloatStencil8
            | wgpu::TextureFormat::Stencil8
    )
}

pub(crate) fn topology(p: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match p {
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

pub(crate) fn blend_state(b: BlendState) -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: blend_factor(b.src_color),
            dst_factor: blend_factor(b.dst_color),
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: blend_factor(b.src_alpha),
            dst_factor: blend_factor(b.dst_alpha),
            operation: wgpu::BlendOperation::Add,
        },
    }
}

pub(crate) fn filter(f: Filter) -> wgpu::FilterMode {
    match f {
        Filter::Nearest => wgpu::FilterMode::Nearest,
        Filter::Linear => wgpu::FilterMode::Linear,
    }
}

pub(crate) fn address_mode(w: Wrap) -> wgpu::AddressMode {
    match w {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}
