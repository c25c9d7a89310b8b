use winit::dpi::PhysicalSize;

use crate::error::FrameError;
use crate::gpu::uniforms::{ResolutionUniform, TimeUniform};

/// What a single frame submission has to draw.
#[derive(Debug)]
pub enum FramePlan<'a, T> {
    /// Scene shader straight into the surface.
    Direct,
    /// Scene into `write` while sampling `read`, then `write` onto the surface.
    Feedback { write: &'a T, read: &'a T },
}

/// GPU operations the render session depends on.
///
/// [`crate::gpu::WgpuBackend`] implements this over a real device and window
/// surface; tests drive sessions with recording implementations instead.
pub trait GpuBackend {
    /// Off-screen colour target used by the feedback pass.
    type Target;

    /// Largest width or height a target or the surface may have.
    fn max_extent(&self) -> u32;

    fn create_target(&mut self, extent: PhysicalSize<u32>) -> Self::Target;

    /// Releases a target that is no longer referenced by the session.
    fn destroy_target(&mut self, target: Self::Target);

    fn configure_surface(&mut self, extent: PhysicalSize<u32>);

    fn write_time(&mut self, time: TimeUniform);

    fn write_resolution(&mut self, resolution: ResolutionUniform);

    /// Encodes every pass of the frame, submits them as one batch and presents.
    fn submit(&mut self, plan: FramePlan<'_, Self::Target>) -> Result<(), FrameError>;
}
