use std::time::{Duration, Instant};

/// Timing snapshot taken once per rendered frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock was created.
    pub elapsed: f32,

    pub now: Instant,

    /// Index of this frame, starting at 0.
    pub frame_index: u64,
}

/// Per-window frame clock.
///
/// Delta time is clamped so a stalled or minimized window does not produce a
/// huge step on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        let base = clock.last;
        assert_eq!(clock.tick_at(base).frame_index, 0);
        assert_eq!(clock.tick_at(base).frame_index, 1);
        assert_eq!(clock.tick_at(base).frame_index, 2);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::with_clamps(
            Duration::from_millis(1),
            Duration::from_millis(100),
        );
        let base = clock.last;

        let tiny = clock.tick_at(base);
        assert!((tiny.dt - 0.001).abs() < 1e-6);

        let stall = clock.tick_at(base + Duration::from_secs(5));
        assert!((stall.dt - 0.1).abs() < 1e-6);
        // Elapsed time is not clamped.
        assert!((stall.elapsed - 5.0).abs() < 1e-3);
    }
}
