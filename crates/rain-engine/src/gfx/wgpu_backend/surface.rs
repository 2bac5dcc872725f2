use anyhow::{Context, Result};

use super::GpuInit;

/// What `WindowSurface::acquire` did after the swapchain refused a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated; the surface was reconfigured for the next frame.
    Reconfigured,
    /// Timeout or driver hiccup; this frame is skipped.
    SkipFrame,
    /// Out of memory; nothing more will be presented.
    Fatal,
}

/// Outcome of asking the swapchain for the next image.
pub(crate) enum Acquired {
    Frame(wgpu::SurfaceTexture),
    Skipped(SurfaceErrorAction),
}

/// The window's swapchain: surface, its configuration and the last size the
/// window reported.
///
/// A zero size (minimized window) is remembered but never configured.
pub(crate) struct WindowSurface {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
}

impl WindowSurface {
    pub fn configure(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        size: (u32, u32),
        init: &GpuInit,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = pick_format(&caps.formats, init.prefer_srgb)
            .context("surface reports no supported formats")?;
        let alpha_mode = pick_alpha_mode(&caps.alpha_modes, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0,
            height: size.1,
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(device, &config);

        Ok(Self {
            surface,
            config,
            size,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Extent the swapchain is configured for.
    pub fn extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn is_presentable(&self) -> bool {
        self.size.0 > 0 && self.size.1 > 0
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        if size == self.size {
            return;
        }
        self.size = size;
        if !self.is_presentable() {
            log::debug!("surface size {}x{}; presentation paused", size.0, size.1);
            return;
        }
        self.config.width = size.0;
        self.config.height = size.1;
        self.surface.configure(device, &self.config);
    }

    pub fn acquire(&mut self, device: &wgpu::Device) -> Acquired {
        match self.surface.get_current_texture() {
            Ok(frame) => Acquired::Frame(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if self.is_presentable() {
                    self.surface.configure(device, &self.config);
                }
                Acquired::Skipped(SurfaceErrorAction::Reconfigured)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Acquired::Skipped(SurfaceErrorAction::Fatal),
            Err(wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other) => {
                Acquired::Skipped(SurfaceErrorAction::SkipFrame)
            }
        }
    }
}

/// First sRGB BGRA/RGBA format when preferred, else the surface's first.
fn pick_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    const SRGB: [wgpu::TextureFormat; 2] = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];
    let preferred = prefer_srgb
        .then(|| SRGB.into_iter().find(|f| formats.contains(f)))
        .flatten();
    preferred.or_else(|| formats.first().copied())
}

fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn srgb_preferred_when_available() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(pick_format(&formats, true), Some(F::Rgba8UnormSrgb));
        assert_eq!(pick_format(&formats, false), Some(F::Bgra8Unorm));
        assert_eq!(pick_format(&[], true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let supported = [wgpu::CompositeAlphaMode::Opaque];
        assert_eq!(
            pick_alpha_mode(&supported, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(pick_alpha_mode(&[], None), wgpu::CompositeAlphaMode::Auto);
    }
}
