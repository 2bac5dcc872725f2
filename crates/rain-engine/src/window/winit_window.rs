use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::config::WindowConfig;

use super::{keys, WindowSystem};

/// Pump iterations allowed for the platform to hand us a window.
const CREATE_ATTEMPTS: u32 = 100;

/// Event-handler half of `WinitWindow`; winit calls into it while pumping.
struct WinitState {
    config: WindowConfig,
    title: String,
    window: Option<Arc<Window>>,
    fb_size: (u32, u32),
    keys_down: HashSet<i32>,
    close_requested: bool,
    create_error: Option<anyhow::Error>,
}

impl WinitState {
    fn new(config: &WindowConfig) -> Self {
        Self {
            config: config.clone(),
            title: config.title.clone(),
            window: None,
            fb_size: (0, 0),
            keys_down: HashSet::new(),
            close_requested: false,
            create_error: None,
        }
    }
}

impl ApplicationHandler for WinitState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(self.config.width),
                f64::from(self.config.height),
            ));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let size = window.inner_size();
                self.fb_size = (size.width, size.height);
                log::info!("window '{}' created ({}x{})", self.title, size.width, size.height);
                self.window = Some(Arc::new(window));
            }
            Err(err) => {
                let err = anyhow::Error::new(err).context("failed to create window");
                self.create_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::debug!("close requested");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.fb_size = (size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else { return };
                let Some(key) = keys::from_winit(code) else { return };
                match event.state {
                    ElementState::Pressed => {
                        self.keys_down.insert(key);
                    }
                    ElementState::Released => {
                        self.keys_down.remove(&key);
                    }
                }
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered while unfocused.
                self.keys_down.clear();
            }
            _ => {}
        }
    }
}

/// OS window driven by pumping the winit event loop once per frame.
pub struct WinitWindow {
    event_loop: EventLoop<()>,
    state: WinitState,
    started: Instant,
}

impl WinitWindow {
    /// Creates the event loop and waits until the platform delivers the window.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let mut event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = WinitState::new(config);
        for _ in 0..CREATE_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut state);
            if let Some(err) = state.create_error.take() {
                return Err(err);
            }
            if state.window.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                anyhow::bail!("event loop exited with code {code} before a window was created");
            }
        }
        anyhow::ensure!(state.window.is_some(), "platform did not create a window");

        Ok(Self {
            event_loop,
            state,
            started: Instant::now(),
        })
    }
}

impl WindowSystem for WinitWindow {
    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn frame(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(code) = status {
            log::debug!("event loop exited with code {code}");
            self.state.close_requested = true;
        }
    }

    fn get_time(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    fn fb_size(&self) -> (u32, u32) {
        self.state.fb_size
    }

    fn is_key_down(&self, key: i32) -> bool {
        self.state.keys_down.contains(&key)
    }

    fn title(&self) -> &str {
        &self.state.title
    }

    fn set_title(&mut self, title: &str) {
        self.state.title = title.to_string();
        if let Some(window) = &self.state.window {
            window.set_title(title);
        }
    }

    fn gfx_target(&self) -> Option<Arc<Window>> {
        self.state.window.clone()
    }
}
