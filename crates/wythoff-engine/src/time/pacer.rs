use std::time::{Duration, Instant};

/// Decision returned by [`FramePacer::poll`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pace {
    /// A frame is due; request a redraw now.
    Redraw,
    /// Sleep until the given deadline before the next redraw.
    WaitUntil(Instant),
}

/// Fixed-interval frame pacing.
///
/// Without an interval every poll yields `Pace::Redraw` (continuous redraw).
/// With one, deadlines advance by the interval; a deadline that fell behind
/// is re-anchored at `now` instead of bursting to catch up.
#[derive(Debug, Clone, Default)]
pub struct FramePacer {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl FramePacer {
    /// Redraws as often as the event loop allows.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Caps redraws at `fps` frames per second. `0` means unlimited.
    pub fn with_fps(fps: u32) -> Self {
        let interval = (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64));
        Self { interval, next: None }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn poll(&mut self, now: Instant) -> Pace {
        let Some(interval) = self.interval else {
            return Pace::Redraw;
        };

        match self.next {
            Some(deadline) if now < deadline => Pace::WaitUntil(deadline),
            Some(deadline) => {
                let mut next = deadline + interval;
                if next <= now {
                    next = now + interval;
                }
                self.next = Some(next);
                Pace::Redraw
            }
            None => {
                self.next = Some(now + interval);
                Pace::Redraw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_always_redraws() {
        let mut p = FramePacer::unlimited();
        let now = Instant::now();
        assert_eq!(p.poll(now), Pace::Redraw);
        assert_eq!(p.poll(now), Pace::Redraw);
        assert_eq!(FramePacer::with_fps(0).interval(), None);
    }

    #[test]
    fn capped_waits_for_deadline() {
        let mut p = FramePacer::with_fps(50);
        let t0 = Instant::now();
        let step = Duration::from_millis(20);

        assert_eq!(p.poll(t0), Pace::Redraw);
        assert_eq!(p.poll(t0 + Duration::from_millis(5)), Pace::WaitUntil(t0 + step));
        assert_eq!(p.poll(t0 + step), Pace::Redraw);
        assert_eq!(p.poll(t0 + step), Pace::WaitUntil(t0 + step * 2));
    }

    #[test]
    fn late_frames_reanchor_instead_of_bursting() {
        let mut p = FramePacer::with_fps(50);
        let t0 = Instant::now();
        let step = Duration::from_millis(20);

        assert_eq!(p.poll(t0), Pace::Redraw);
        let late = t0 + Duration::from_millis(100);
        assert_eq!(p.poll(late), Pace::Redraw);
        assert_eq!(p.poll(late), Pace::WaitUntil(late + step));
    }
}
