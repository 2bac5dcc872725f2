use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::WindowConfig;

use super::WindowSystem;

#[derive(Debug, Clone, Copy)]
enum Clock {
    Real(Instant),
    /// Every frame advances time by exactly this many seconds.
    Fixed(f32),
}

/// Window without an OS surface, for tests and offline runs.
///
/// With a frame budget it reports `should_close` after that many frames.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    title: String,
    fb_size: (u32, u32),
    frame_budget: Option<u64>,
    frames: u64,
    clock: Clock,
    keys_down: HashSet<i32>,
}

impl HeadlessWindow {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            title: config.title.clone(),
            fb_size: (config.width, config.height),
            frame_budget: None,
            frames: 0,
            clock: Clock::Real(Instant::now()),
            keys_down: HashSet::new(),
        }
    }

    pub fn with_frame_budget(mut self, frames: u64) -> Self {
        self.frame_budget = Some(frames);
        self
    }

    pub fn with_fixed_step(mut self, seconds: f32) -> Self {
        self.clock = Clock::Fixed(seconds);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn press_key(&mut self, key: i32) {
        self.keys_down.insert(key);
    }

    pub fn release_key(&mut self, key: i32) {
        self.keys_down.remove(&key);
    }
}

impl WindowSystem for HeadlessWindow {
    fn should_close(&self) -> bool {
        self.frame_budget.is_some_and(|budget| self.frames >= budget)
    }

    fn frame(&mut self) {
        self.frames += 1;
    }

    fn get_time(&self) -> f32 {
        match self.clock {
            Clock::Real(start) => start.elapsed().as_secs_f32(),
            Clock::Fixed(step) => self.frames as f32 * step,
        }
    }

    fn fb_size(&self) -> (u32, u32) {
        self.fb_size
    }

    fn is_key_down(&self, key: i32) -> bool {
        self.keys_down.contains(&key)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn gfx_target(&self) -> Option<Arc<winit::window::Window>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_closes_after_n_frames() {
        let mut w = HeadlessWindow::new(&WindowConfig::default()).with_frame_budget(3);
        let mut polls = 0;
        while !w.should_close() {
            polls += 1;
            w.frame();
        }
        assert_eq!(polls, 3);
    }

    #[test]
    fn fixed_step_clock_advances_per_frame() {
        let mut w = HeadlessWindow::new(&WindowConfig::default()).with_fixed_step(0.5);
        assert_eq!(w.get_time(), 0.0);
        w.frame();
        w.frame();
        assert_eq!(w.get_time(), 1.0);
    }

    #[test]
    fn key_state_follows_press_and_release() {
        let mut w = HeadlessWindow::new(&WindowConfig::default());
        w.press_key(32);
        assert!(w.is_key_down(32));
        w.release_key(32);
        assert!(!w.is_key_down(32));
    }
}
