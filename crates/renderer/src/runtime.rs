use std::time::{Duration, Instant};

/// What the event loop should do before the next wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameDecision {
    /// Request a redraw now.
    Render,
    /// Sleep until the capped frame is due.
    WaitUntil(Instant),
    /// Request nothing and sleep until an event arrives.
    Idle,
}

/// Throttles redraws to an optional frame cap. Without a cap every vblank
/// renders.
#[derive(Debug)]
pub(crate) struct FramePacer {
    target_interval: Option<Duration>,
    accumulator: Duration,
    last_tick: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: Option<f32>) -> Self {
        let target_interval = target_fps.and_then(|fps| {
            if fps > 0.0 && fps.is_finite() {
                Some(Duration::from_secs_f32(1.0 / fps))
            } else {
                None
            }
        });
        Self {
            target_interval,
            accumulator: Duration::ZERO,
            last_tick: None,
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last_tick = Some(Instant::now());
    }

    /// Pacing for a window that may be hidden. A hidden window idles and the
    /// frame budget restarts once it is visible again.
    pub fn decide(&mut self, visible: bool) -> FrameDecision {
        self.decide_at(Instant::now(), visible)
    }

    fn decide_at(&mut self, now: Instant, visible: bool) -> FrameDecision {
        if !visible {
            self.accumulator = Duration::ZERO;
            self.last_tick = None;
            return FrameDecision::Idle;
        }
        if self.should_render_at(now) {
            return FrameDecision::Render;
        }
        match self.next_deadline() {
            Some(deadline) => FrameDecision::WaitUntil(deadline),
            None => FrameDecision::Idle,
        }
    }

    fn should_render_at(&mut self, now: Instant) -> bool {
        match (self.target_interval, self.last_tick) {
            (Some(interval), Some(last)) => {
                let delta = now.saturating_duration_since(last);
                self.last_tick = Some(now);
                self.accumulator = self.accumulator.saturating_add(delta);
                if self.accumulator + Duration::from_micros(250) < interval {
                    false
                } else {
                    self.accumulator = self.accumulator.saturating_sub(interval);
                    true
                }
            }
            _ => {
                self.last_tick = Some(now);
                true
            }
        }
    }

    /// When the next capped frame is due, for `ControlFlow::WaitUntil`.
    pub fn next_deadline(&self) -> Option<Instant> {
        let interval = self.target_interval?;
        let last = self.last_tick?;
        Some(last + interval.saturating_sub(self.accumulator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_always_renders() {
        let mut pacer = FramePacer::new(None);
        let now = Instant::now();
        assert!(pacer.should_render_at(now));
        assert!(pacer.should_render_at(now));
        assert_eq!(pacer.next_deadline(), None);
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let mut pacer = FramePacer::new(Some(0.0));
        assert!(pacer.should_render_at(Instant::now()));
        assert_eq!(pacer.next_deadline(), None);
    }

    #[test]
    fn capped_pacer_waits_for_the_interval() {
        let mut pacer = FramePacer::new(Some(10.0));
        let start = Instant::now();
        assert!(pacer.should_render_at(start));
        assert!(!pacer.should_render_at(start + Duration::from_millis(30)));
        assert!(pacer.should_render_at(start + Duration::from_millis(100)));
        assert!(pacer.next_deadline().is_some());
    }

    #[test]
    fn hidden_window_idles_instead_of_redrawing() {
        let mut pacer = FramePacer::new(None);
        let start = Instant::now();
        assert_eq!(pacer.decide_at(start, false), FrameDecision::Idle);
        assert_eq!(
            pacer.decide_at(start + Duration::from_millis(1), false),
            FrameDecision::Idle
        );
        assert_eq!(
            pacer.decide_at(start + Duration::from_millis(2), true),
            FrameDecision::Render
        );
    }

    #[test]
    fn capped_pacer_waits_then_restarts_after_being_hidden() {
        let mut pacer = FramePacer::new(Some(4.0));
        let start = Instant::now();
        assert_eq!(pacer.decide_at(start, true), FrameDecision::Render);
        assert_eq!(
            pacer.decide_at(start + Duration::from_millis(100), true),
            FrameDecision::WaitUntil(start + Duration::from_millis(250))
        );
        assert_eq!(
            pacer.decide_at(start + Duration::from_millis(150), false),
            FrameDecision::Idle
        );
        assert_eq!(
            pacer.decide_at(start + Duration::from_secs(5), true),
            FrameDecision::Render
        );
    }
}
