use std::borrow::Cow;
use std::time::Duration;

use crate::feedback::FeedbackBlend;

/// How a demo turns its shader into pixels each frame.
///
/// * `Direct` draws the scene shader straight into the window surface.
/// * `Feedback` renders the scene into one of two off-screen targets while
///   sampling the other (the previous frame), then blits the fresh target to
///   the surface through the copy shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassMode {
    Direct,
    #[default]
    Feedback,
}

impl PassMode {
    pub fn is_feedback(self) -> bool {
        matches!(self, PassMode::Feedback)
    }
}

impl std::fmt::Display for PassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassMode::Direct => f.write_str("single-pass"),
            PassMode::Feedback => f.write_str("feedback"),
        }
    }
}

/// WGSL source for a scene shader together with a label used in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    label: Cow<'static, str>,
    source: Cow<'static, str>,
}

impl ShaderProgram {
    /// Wraps shader text that ships inside the binary.
    pub const fn bundled(label: &'static str, source: &'static str) -> Self {
        Self {
            label: Cow::Borrowed(label),
            source: Cow::Borrowed(source),
        }
    }

    /// Wraps shader text loaded at run time (e.g. from a user file).
    pub fn owned(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: Cow::Owned(label.into()),
            source: Cow::Owned(source.into()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Match the browser canvas behaviour (gamma-encoded, non-sRGB swapchain).
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Adapter selection hint forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Upper bounds on how long a render loop may run before it stops by itself.
///
/// An empty budget runs until the cancellation token fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBudget {
    pub max_frames: Option<u64>,
    pub max_duration: Option<Duration>,
}

impl FrameBudget {
    pub const UNBOUNDED: Self = Self {
        max_frames: None,
        max_duration: None,
    };

    pub fn frames(count: u64) -> Self {
        Self {
            max_frames: Some(count),
            max_duration: None,
        }
    }

    pub fn duration(limit: Duration) -> Self {
        Self {
            max_frames: None,
            max_duration: Some(limit),
        }
    }

    /// True once either limit has been reached.
    pub fn exhausted(&self, frames: u64, elapsed: Duration) -> bool {
        self.max_frames.is_some_and(|max| frames >= max)
            || self.max_duration.is_some_and(|max| elapsed >= max)
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// One `RendererConfig` describes a whole demo: which shader to compile,
/// whether to run the ping-pong feedback pass, how strongly the previous
/// frame bleeds into the next one, and how the window should be created.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Title shown on the window; the live FPS is appended to it.
    pub title: String,
    /// Initial window size in logical pixels.
    pub logical_size: (u32, u32),
    /// Scene shader.
    pub program: ShaderProgram,
    /// Single-pass or feedback rendering.
    pub mode: PassMode,
    /// Decay and blend weight fed to the feedback shader.
    pub blend: FeedbackBlend,
    pub color_space: ColorSpaceMode,
    pub gpu_power: GpuPowerPreference,
    /// Prefer a vsync'd present mode (the native analogue of `requestAnimationFrame`).
    pub vsync: bool,
    /// Optional limits after which the window closes itself.
    pub budget: FrameBudget,
}

impl RendererConfig {
    pub fn new(program: ShaderProgram) -> Self {
        Self {
            title: program.label().to_string(),
            logical_size: (512, 512),
            program,
            mode: PassMode::default(),
            blend: FeedbackBlend::default(),
            color_space: ColorSpaceMode::default(),
            gpu_power: GpuPowerPreference::default(),
            vsync: true,
            budget: FrameBudget::UNBOUNDED,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_logical_size(mut self, width: u32, height: u32) -> Self {
        self.logical_size = (width, height);
        self
    }

    pub fn with_mode(mut self, mode: PassMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_blend(mut self, blend: FeedbackBlend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpaceMode) -> Self {
        self.color_space = color_space;
        self
    }

    pub fn with_gpu_power(mut self, gpu_power: GpuPowerPreference) -> Self {
        self.gpu_power = gpu_power;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_budget(mut self, budget: FrameBudget) -> Self {
        self.budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_budget_never_exhausts() {
        let budget = FrameBudget::UNBOUNDED;
        assert!(!budget.exhausted(u64::MAX, Duration::from_secs(3600)));
    }

    #[test]
    fn budget_stops_on_whichever_limit_hits_first() {
        let budget = FrameBudget {
            max_frames: Some(10),
            max_duration: Some(Duration::from_secs(1)),
        };
        assert!(!budget.exhausted(9, Duration::from_millis(900)));
        assert!(budget.exhausted(10, Duration::from_millis(10)));
        assert!(budget.exhausted(1, Duration::from_secs(1)));
    }

    #[test]
    fn config_builder_keeps_program_label_as_default_title() {
        let config = RendererConfig::new(ShaderProgram::bundled("demo", "// empty"))
            .with_mode(PassMode::Direct)
            .with_logical_size(800, 600);
        assert_eq!(config.title, "demo");
        assert_eq!(config.logical_size, (800, 600));
        assert_eq!(config.mode, PassMode::Direct);
        assert!(config.vsync);
    }
}
