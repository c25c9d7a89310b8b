/// The platform has no adapter or device able to drive the renderer.
///
/// This is the one failure the binary reports with a fixed message instead
/// of the error chain, so it is kept as a concrete type that callers can
/// recover with `anyhow::Error::downcast_ref`.
#[derive(Debug, thiserror::Error)]
#[error("GPU rendering is not available: {reason}")]
pub struct GpuUnavailable {
    reason: String,
}

impl GpuUnavailable {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Why a frame could not be presented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The surface no longer matches the window and must be configured again.
    #[error("surface is outdated or lost")]
    Outdated,
    /// Acquiring the next surface texture timed out.
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("GPU is out of memory")]
    OutOfMemory,
    #[error("frame failed: {0}")]
    Other(String),
}

impl FrameError {
    /// Fatal errors stop the render loop; everything else skips one frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::OutOfMemory)
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(value: wgpu::SurfaceError) -> Self {
        match value {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => FrameError::Outdated,
            wgpu::SurfaceError::Timeout => FrameError::Timeout,
            wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
            other => FrameError::Other(format!("{other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert!(FrameError::OutOfMemory.is_fatal());
        assert!(!FrameError::Outdated.is_fatal());
        assert!(!FrameError::Timeout.is_fatal());
        assert!(!FrameError::Other("driver hiccup".into()).is_fatal());
    }

    #[test]
    fn surface_errors_map_to_frame_errors() {
        assert_eq!(
            FrameError::from(wgpu::SurfaceError::Lost),
            FrameError::Outdated
        );
        assert_eq!(
            FrameError::from(wgpu::SurfaceError::Outdated),
            FrameError::Outdated
        );
        assert_eq!(
            FrameError::from(wgpu::SurfaceError::Timeout),
            FrameError::Timeout
        );
        assert_eq!(
            FrameError::from(wgpu::SurfaceError::OutOfMemory),
            FrameError::OutOfMemory
        );
    }

    #[test]
    fn gpu_unavailable_survives_anyhow_context() {
        let err = anyhow::Error::new(GpuUnavailable::new("no adapter"))
            .context("failed to initialise renderer");
        let unavailable = err
            .downcast_ref::<GpuUnavailable>()
            .expect("downcast through context");
        assert_eq!(unavailable.reason(), "no adapter");
    }
}
