/// Device and swapchain settings for `WgpuBackend::new`.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick `Bgra8UnormSrgb`/`Rgba8UnormSrgb` for the window when offered.
    pub prefer_srgb: bool,

    /// `Fifo` paces `commit` to the display; see `with_vsync`.
    pub present_mode: wgpu::PresentMode,

    /// Ignored when the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Frames the presentation engine may queue ahead of the CPU.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Same settings, presenting with (`Fifo`) or without (`AutoNoVsync`) vsync.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = match vsync {
            true => wgpu::PresentMode::Fifo,
            false => wgpu::PresentMode::AutoNoVsync,
        };
        self
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
