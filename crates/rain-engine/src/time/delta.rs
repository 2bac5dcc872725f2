/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous tick.
    pub dt: f32,
}

/// Turns successive window-clock samples into per-frame deltas.
///
/// Deltas are unclamped; a stall shows up as one long frame.
#[derive(Debug, Clone)]
pub struct DeltaTimer {
    last: f32,
}

impl DeltaTimer {
    /// Starts timing from the given clock value.
    pub fn new(start: f32) -> Self {
        Self { last: start }
    }

    /// Advances to `now` and returns the frame's timing.
    ///
    /// A clock that runs backwards yields a zero delta.
    pub fn tick(&mut self, now: f32) -> FrameTime {
        let dt = (now - self.last).max(0.0);
        self.last = now;
        FrameTime { dt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_difference_from_previous_sample() {
        let mut t = DeltaTimer::new(1.0);
        assert_eq!(t.tick(1.25).dt, 0.25);
        assert_eq!(t.tick(1.75).dt, 0.5);
    }

    #[test]
    fn backwards_clock_gives_zero_delta() {
        let mut t = DeltaTimer::new(5.0);
        assert_eq!(t.tick(4.0).dt, 0.0);
        assert_eq!(t.tick(4.5).dt, 0.5);
    }
}
