use std::time::Instant;

/// Snapshot of the frame clock handed to the uniform bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the exhibit mounted.
    pub seconds: f32,
    /// Frames drawn since the exhibit mounted.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Restarts the clock; called whenever an exhibit mounts.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let elapsed = self.origin.elapsed();
        let sample = TimeSample::new(elapsed.as_secs_f32(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Deterministic clock that advances by a fixed step per sample.
#[derive(Debug, Clone, Copy)]
pub struct SteppedTimeSource {
    step: f32,
    frame: u64,
}

impl SteppedTimeSource {
    pub fn new(step: f32) -> Self {
        Self { step, frame: 0 }
    }
}

impl TimeSource for SteppedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.step * self.frame as f32, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

pub type BoxedTimeSource = Box<dyn TimeSource + Send>;
