/// Number of frames averaged by [`FrameClock::average_fps`].
pub const FPS_WINDOW: usize = 10;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame, after flooring. Zero on the first frame.
    pub dt: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame-rate meter.
///
/// Each frame records `1 / dt` into a small ring buffer. Delta time is floored
/// so back-to-back frames on a coarse timer do not report infinite rates.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<f64>,
    frame_index: u64,
    dt_min: f64,
    samples: [f64; FPS_WINDOW],
    filled: usize,
    cursor: usize,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_min_dt(0.000_1)
    }

    pub fn with_min_dt(dt_min: f64) -> Self {
        debug_assert!(dt_min > 0.0);
        Self {
            last: None,
            frame_index: 0,
            dt_min,
            samples: [0.0; FPS_WINDOW],
            filled: 0,
            cursor: 0,
        }
    }

    /// Forgets the previous frame; the next `begin_frame` records nothing.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Marks the start of a frame at `now` seconds.
    pub fn begin_frame(&mut self, now: f64) -> FrameTime {
        let dt = match self.last {
            Some(last) => {
                let dt = (now - last).max(self.dt_min);
                self.record(1.0 / dt);
                dt
            }
            None => 0.0,
        };
        self.last = Some(now);

        let time = FrameTime {
            dt,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }

    fn record(&mut self, fps: f64) {
        self.samples[self.cursor] = fps;
        self.cursor = (self.cursor + 1) % FPS_WINDOW;
        self.filled = (self.filled + 1).min(FPS_WINDOW);
    }

    /// Rate implied by the most recent frame, or zero before two frames.
    pub fn fps(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.samples[(self.cursor + FPS_WINDOW - 1) % FPS_WINDOW]
    }

    /// Mean of the recorded rates over the last [`FPS_WINDOW`] frames.
    pub fn average_fps(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let sum: f64 = if self.filled < FPS_WINDOW {
            self.samples[..self.filled].iter().sum()
        } else {
            self.samples.iter().sum()
        };
        sum / self.filled as f64
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
