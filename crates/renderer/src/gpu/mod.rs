//! `wgpu` implementation of [`GpuBackend`].
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain on resize.
//! - `pipeline` validates shaders and builds the scene and copy pipelines.
//! - `targets` allocates the ping-pong colour textures.
//! - `uniforms` mirrors the time and resolution buffers.

mod context;
mod pipeline;
mod targets;
pub(crate) mod uniforms;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::backend::{FramePlan, GpuBackend};
use crate::error::FrameError;
use crate::types::RendererConfig;

use context::GpuContext;
use pipeline::{create_feedback_sampler, encode_fullscreen, CopyPipeline, ScenePipeline};
use uniforms::{ResolutionUniform, TimeUniform, UniformBuffers};

pub use targets::FeedbackTarget;

/// Renders sessions into a window surface.
pub struct WgpuBackend {
    context: GpuContext,
    uniforms: UniformBuffers,
    sampler: wgpu::Sampler,
    scene: ScenePipeline,
    copy: Option<CopyPipeline>,
    direct_bind_group: Option<wgpu::BindGroup>,
    targets_created: u64,
}

impl WgpuBackend {
    /// Acquires the GPU and compiles the pipelines for `config`.
    ///
    /// `target` must outlive the backend.
    pub fn new<T>(target: &T, initial_size: PhysicalSize<u32>, config: &RendererConfig) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(
            target,
            initial_size,
            config.color_space,
            config.gpu_power,
            config.vsync,
        )?;
        let device = &context.device;
        let format = context.surface_format;

        let uniforms = UniformBuffers::new(device);
        let sampler = create_feedback_sampler(device);
        let scene = ScenePipeline::new(device, &config.program, config.mode, &config.blend, format)?;
        let copy = if config.mode.is_feedback() {
            Some(CopyPipeline::new(device, format)?)
        } else {
            None
        };
        let direct_bind_group = scene.direct_bind_group(device, &uniforms);

        tracing::info!(
            shader = config.program.label(),
            mode = %config.mode,
            ?format,
            "renderer ready"
        );

        Ok(Self {
            context,
            uniforms,
            sampler,
            scene,
            copy,
            direct_bind_group,
            targets_created: 0,
        })
    }

}

impl GpuBackend for WgpuBackend {
    type Target = FeedbackTarget;

    fn max_extent(&self) -> u32 {
        self.context.max_dimension
    }

    fn create_target(&mut self, extent: PhysicalSize<u32>) -> FeedbackTarget {
        let label = format!("feedback target #{}", self.targets_created % 2);
        self.targets_created += 1;
        FeedbackTarget::new(
            &self.context.device,
            self.context.surface_format,
            extent,
            &label,
        )
    }

    fn destroy_target(&mut self, target: FeedbackTarget) {
        target.destroy();
    }

    fn configure_surface(&mut self, extent: PhysicalSize<u32>) {
        self.context.resize(extent);
    }

    fn write_time(&mut self, time: TimeUniform) {
        self.uniforms.write_time(&self.context.queue, time);
    }

    fn write_resolution(&mut self, resolution: ResolutionUniform) {
        self.uniforms
            .write_resolution(&self.context.queue, resolution);
    }

    fn submit(&mut self, plan: FramePlan<'_, FeedbackTarget>) -> Result<(), FrameError> {
        let frame = self.context.acquire_frame()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let device = &self.context.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });

        match plan {
            FramePlan::Direct => {
                let bind_group = self.direct_bind_group.as_ref().ok_or_else(|| {
                    FrameError::Other("single-pass frame submitted to a feedback pipeline".into())
                })?;
                encode_fullscreen(
                    &mut encoder,
                    "scene pass",
                    &surface_view,
                    &self.scene.pipeline,
                    bind_group,
                );
            }
            FramePlan::Feedback { write, read } => {
                let copy = self.copy.as_ref().ok_or_else(|| {
                    FrameError::Other("feedback frame submitted to a single-pass pipeline".into())
                })?;
                let scene_group =
                    self.scene
                        .feedback_bind_group(device, &self.uniforms, &read.view, &self.sampler);
                encode_fullscreen(
                    &mut encoder,
                    "feedback pass",
                    &write.view,
                    &self.scene.pipeline,
                    &scene_group,
                );
                let copy_group = copy.bind_group(device, &write.view, &self.sampler);
                encode_fullscreen(
                    &mut encoder,
                    "present pass",
                    &surface_view,
                    &copy.pipeline,
                    &copy_group,
                );
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
