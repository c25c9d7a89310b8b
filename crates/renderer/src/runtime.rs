use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::GpuBackend;
use crate::error::FrameError;
use crate::session::{FrameStatus, RenderSession};
use crate::types::FrameBudget;

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time since the source was reset.
    pub elapsed: Duration,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(elapsed: Duration, frame_index: u64) -> Self {
        Self {
            elapsed,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
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
        let sample = TimeSample::new(self.origin.elapsed(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that advances by a fixed step per sample, starting at zero.
///
/// Used for headless runs and tests where frame timing must be reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepTimeSource {
    step: Duration,
    frame: u64,
}

impl FixedStepTimeSource {
    pub fn new(step: Duration) -> Self {
        Self { step, frame: 0 }
    }

    /// Steps of `1 / fps` seconds.
    pub fn at_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / f64::from(fps.max(1))))
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl TimeSource for FixedStepTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let factor = u32::try_from(self.frame).unwrap_or(u32::MAX);
        let sample = TimeSample::new(self.step.saturating_mul(factor), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Frames-per-second over one-second windows.
///
/// The first recorded timestamp opens the window; every later frame is
/// counted, and once more than a second has passed the count is published
/// and the window restarts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpsCounter {
    window_start: Option<Duration>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one frame at `now`; returns the new FPS when a window closes.
    pub fn record(&mut self, now: Duration) -> Option<u32> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };
        self.frames = self.frames.saturating_add(1);
        if now.saturating_sub(start) > Self::WINDOW {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start = Some(now);
            return Some(self.fps);
        }
        None
    }

    /// Last published value; zero until the first window closes.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Cooperative stop signal shared between the render loop and its host.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Summary of a finished render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopReport {
    pub presented: u64,
    pub skipped: u64,
    /// Last FPS value published during the run.
    pub fps: u32,
}

impl LoopReport {
    pub fn frames(&self) -> u64 {
        self.presented + self.skipped
    }

    pub(crate) fn record(&mut self, status: FrameStatus, fps: u32) {
        match status {
            FrameStatus::Presented => self.presented += 1,
            FrameStatus::Skipped => self.skipped += 1,
        }
        self.fps = fps;
    }
}

/// Host-independent frame driver.
///
/// The window driver schedules ticks from winit events; `FrameLoop` drives a
/// session directly, which is what headless runs and tests use.
pub struct FrameLoop;

impl FrameLoop {
    /// Ticks `session` until `token` is cancelled or `budget` runs out.
    ///
    /// Skipped frames count against the frame budget. A fatal frame error
    /// stops the loop and is returned.
    pub fn run<B: GpuBackend>(
        session: &mut RenderSession<B>,
        time: &mut dyn TimeSource,
        token: &CancellationToken,
        budget: FrameBudget,
    ) -> Result<LoopReport, FrameError> {
        time.reset();
        let mut report = LoopReport::default();
        while !token.is_cancelled() {
            let sample = time.sample();
            if budget.exhausted(report.frames(), sample.elapsed) {
                tracing::debug!(
                    frames = report.frames(),
                    elapsed = ?sample.elapsed,
                    "frame budget exhausted"
                );
                break;
            }
            let status = session.tick(sample.elapsed)?;
            report.record(status, session.fps());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_source_starts_at_zero_and_resets() {
        let mut source = FixedStepTimeSource::new(Duration::from_millis(10));
        assert_eq!(source.sample().elapsed, Duration::ZERO);
        assert_eq!(source.sample().elapsed, Duration::from_millis(10));
        let third = source.sample();
        assert_eq!(third.elapsed, Duration::from_millis(20));
        assert_eq!(third.frame_index, 2);
        source.reset();
        assert_eq!(source.sample().frame_index, 0);
    }

    #[test]
    fn fps_counter_reports_sixty_for_sixty_hertz() {
        let mut source = FixedStepTimeSource::at_fps(60);
        let mut counter = FpsCounter::new();
        let mut published = None;
        while published.is_none() {
            let sample = source.sample();
            published = counter.record(sample.elapsed);
            assert!(sample.elapsed < Duration::from_secs(2));
        }
        let fps = published.unwrap_or_default();
        assert!((59..=61).contains(&fps), "fps = {fps}");
        assert_eq!(counter.fps(), fps);
    }

    #[test]
    fn fps_counter_waits_for_a_full_window() {
        let mut counter = FpsCounter::new();
        assert_eq!(counter.record(Duration::ZERO), None);
        assert_eq!(counter.record(Duration::from_millis(500)), None);
        assert_eq!(counter.record(Duration::from_millis(1000)), None);
        assert_eq!(counter.record(Duration::from_millis(1001)), Some(3));
        assert_eq!(counter.fps(), 3);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
