//! Renderer crate for the raymarch feedback demos.
//!
//! A demo is one WGSL raymarching shader animated by a time uniform. In
//! feedback mode the previous frame is sampled back into the next one through
//! a pair of ping-pong targets, which gives the trailing look:
//!
//! ```text
//!   frame N:   scene(time, resolution, target[prev]) ──▶ target[cur]
//!                                                          │
//!              copy(target[cur]) ──▶ surface ◀─────────────┘
//!   frame N+1: cur and prev swap roles
//! ```
//!
//! `RenderSession` owns the per-demo state (uniforms, targets, frame index,
//! FPS) and talks to the GPU through the `GpuBackend` trait. `WgpuBackend` is
//! the real implementation; `run_windowed` drives it from a winit event loop,
//! and `FrameLoop` drives any backend headlessly.

mod backend;
mod compile;
mod error;
mod feedback;
mod gpu;
mod presets;
mod runtime;
mod session;
mod types;
mod window;

pub use backend::{FramePlan, GpuBackend};
pub use compile::{
    validate_wgsl, BindingKind, ShaderContract, ShaderContractError, ShaderInterface,
    FRAGMENT_ENTRY, VERTEX_ENTRY,
};
pub use error::{FrameError, GpuUnavailable};
pub use feedback::{FeedbackBlend, FeedbackPair, FrameState};
pub use gpu::uniforms::{ResolutionUniform, TimeUniform, UniformBlock};
pub use gpu::{FeedbackTarget, WgpuBackend};
pub use presets::{Preset, COPY_SHADER};
pub use runtime::{
    CancellationToken, FixedStepTimeSource, FpsCounter, FrameLoop, LoopReport,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use session::{physical_extent, FrameStatus, RenderSession};
pub use types::{
    ColorSpaceMode, FrameBudget, GpuPowerPreference, PassMode, RendererConfig, ShaderProgram,
};
pub use window::run_windowed;
