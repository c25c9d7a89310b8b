use std::time::Duration;

use winit::dpi::{LogicalSize, PhysicalSize};

use crate::backend::{FramePlan, GpuBackend};
use crate::error::FrameError;
use crate::feedback::{FeedbackPair, FrameState};
use crate::gpu::uniforms::UniformBlock;
use crate::runtime::FpsCounter;
use crate::types::PassMode;

/// Outcome of one [`RenderSession::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// Nothing reached the screen; the feedback slots were left untouched.
    Skipped,
}

/// Converts a logical size and device pixel ratio into a drawable extent.
///
/// Returns `None` for zero-area results, which is what a minimised window
/// reports.
pub fn physical_extent(logical: LogicalSize<f64>, scale_factor: f64) -> Option<PhysicalSize<u32>> {
    let physical: PhysicalSize<u32> = logical.to_physical(scale_factor);
    (physical.width > 0 && physical.height > 0).then_some(physical)
}

/// All mutable per-demo state: uniforms, feedback targets, frame index and
/// FPS counter, plus the backend that turns them into GPU work.
pub struct RenderSession<B: GpuBackend> {
    backend: B,
    mode: PassMode,
    extent: PhysicalSize<u32>,
    targets: Option<FeedbackPair<B::Target>>,
    frame: FrameState,
    uniforms: UniformBlock,
    fps: FpsCounter,
}

impl<B: GpuBackend> RenderSession<B> {
    /// Builds a session and performs the initial resize.
    ///
    /// A zero-area starting size falls back to a 1x1 extent so the session
    /// always owns valid targets.
    pub fn new(backend: B, mode: PassMode, logical: LogicalSize<f64>, scale_factor: f64) -> Self {
        let mut session = Self {
            backend,
            mode,
            extent: PhysicalSize::new(0, 0),
            targets: None,
            frame: FrameState::default(),
            uniforms: UniformBlock::default(),
            fps: FpsCounter::new(),
        };
        let extent = physical_extent(logical, scale_factor).unwrap_or(PhysicalSize::new(1, 1));
        session.resize_physical(extent);
        session
    }

    /// Handles a resize notification expressed in logical pixels.
    ///
    /// Returns `false` when the request was ignored because it has no area.
    pub fn resize(&mut self, logical: LogicalSize<f64>, scale_factor: f64) -> bool {
        match physical_extent(logical, scale_factor) {
            Some(extent) => self.resize_physical(extent),
            None => {
                tracing::debug!(
                    width = logical.width,
                    height = logical.height,
                    scale_factor,
                    "ignoring zero-sized resize"
                );
                false
            }
        }
    }

    /// Handles a resize notification already expressed in physical pixels.
    pub fn resize_physical(&mut self, extent: PhysicalSize<u32>) -> bool {
        if extent.width == 0 || extent.height == 0 {
            tracing::debug!(?extent, "ignoring zero-sized resize");
            return false;
        }

        let extent = self.clamp_to_limit(extent);
        self.extent = extent;
        self.uniforms.set_resolution(extent.width, extent.height);
        self.backend.write_resolution(self.uniforms.resolution);

        if let Some(previous) = self.targets.take() {
            for target in previous.into_inner() {
                self.backend.destroy_target(target);
            }
        }
        if self.mode.is_feedback() {
            let first = self.backend.create_target(extent);
            let second = self.backend.create_target(extent);
            self.targets = Some(FeedbackPair::new(first, second));
        }

        self.backend.configure_surface(extent);
        tracing::debug!(
            width = extent.width,
            height = extent.height,
            mode = %self.mode,
            "reconfigured render targets"
        );
        true
    }

    /// Caps each dimension at the backend's texture limit.
    fn clamp_to_limit(&self, extent: PhysicalSize<u32>) -> PhysicalSize<u32> {
        let max = self.backend.max_extent().max(1);
        if extent.width <= max && extent.height <= max {
            return extent;
        }
        let clamped = PhysicalSize::new(extent.width.min(max), extent.height.min(max));
        tracing::warn!(
            requested = ?extent,
            ?clamped,
            max,
            "resize exceeds the GPU texture limit; clamping"
        );
        clamped
    }

    /// Renders one frame at `elapsed` since the session started.
    ///
    /// Recoverable surface problems skip the frame; only out-of-memory is
    /// returned as an error.
    pub fn tick(&mut self, elapsed: Duration) -> Result<FrameStatus, FrameError> {
        if let Some(fps) = self.fps.record(elapsed) {
            tracing::debug!(fps, "render stats");
        }

        self.uniforms.set_time(elapsed.as_secs_f32());
        self.backend.write_time(self.uniforms.time);

        let result = match &self.targets {
            Some(pair) if self.mode.is_feedback() => self.backend.submit(FramePlan::Feedback {
                write: pair.write(self.frame),
                read: pair.read(self.frame),
            }),
            _ => self.backend.submit(FramePlan::Direct),
        };

        match result {
            Ok(()) => {
                if self.mode.is_feedback() {
                    self.frame.toggle();
                }
                Ok(FrameStatus::Presented)
            }
            Err(FrameError::Outdated) => {
                tracing::debug!(extent = ?self.extent, "surface outdated; reconfiguring");
                self.backend.configure_surface(self.extent);
                Ok(FrameStatus::Skipped)
            }
            Err(err) if err.is_fatal() => {
                tracing::error!(error = %err, "fatal frame error");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping frame");
                Ok(FrameStatus::Skipped)
            }
        }
    }

    pub fn mode(&self) -> PassMode {
        self.mode
    }

    pub fn extent(&self) -> PhysicalSize<u32> {
        self.extent
    }

    /// Feedback slot written by the next frame.
    pub fn current_index(&self) -> usize {
        self.frame.current_index()
    }

    pub fn resolution(&self) -> [f32; 2] {
        self.uniforms.resolution.size
    }

    pub fn time(&self) -> f32 {
        self.uniforms.time.seconds
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    pub fn targets(&self) -> Option<&FeedbackPair<B::Target>> {
        self.targets.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
