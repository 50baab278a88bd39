use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Seconds since the clock baseline, unscaled.
    pub elapsed: f32,

    /// Shader time: `elapsed * speed`.
    pub time: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Frames ticked since the clock baseline.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls. Elapsed time is not clamped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    speed: f32,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps and unit speed.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last: now,
            frame_index: 0,
            speed: 1.0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Sets the factor applied to elapsed time when producing `FrameTime::time`.
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Number of frames ticked since the last restart.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Restarts elapsed time and the frame counter from now.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    fn reset_at(&mut self, now: Instant) {
        self.start = now;
        self.last = now;
        self.frame_index = 0;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed,
            time: elapsed * self.speed,
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
    fn time_is_scaled_by_speed() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0).with_speed(20.0);

        let ft = clock.tick_at(t0 + Duration::from_millis(500));
        assert!((ft.elapsed - 0.5).abs() < 1e-6);
        assert!((ft.time - 10.0).abs() < 1e-4);
    }

    #[test]
    fn frame_index_counts_ticks() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        assert_eq!(clock.tick_at(t0).frame_index, 0);
        assert_eq!(clock.tick_at(t0 + Duration::from_millis(16)).frame_index, 1);
        assert_eq!(clock.frame_index(), 2);

    }

    #[test]
    fn reset_restarts_elapsed_and_frames() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0).with_speed(20.0);
        clock.tick_at(t0 + Duration::from_secs(2));

        clock.reset_at(t0 + Duration::from_secs(5));
        let ft = clock.tick_at(t0 + Duration::from_millis(5_100));
        assert_eq!(ft.frame_index, 0);
        assert!((ft.elapsed - 0.1).abs() < 1e-4);
        assert!((ft.time - 2.0).abs() < 1e-3);
    }

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let ft = clock.tick_at(t0 + Duration::from_secs(3));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert!((ft.elapsed - 3.0).abs() < 1e-6);

        let ft = clock.tick_at(t0 + Duration::from_secs(3));
        assert!((ft.dt - 0.0001).abs() < 1e-6);
    }
}
