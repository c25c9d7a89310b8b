use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::window::{Window, WindowBuilder};

use crate::error::FrameError;
use crate::gpu::WgpuBackend;
use crate::runtime::{CancellationToken, LoopReport, SystemTimeSource, TimeSource};
use crate::session::RenderSession;
use crate::types::{FrameBudget, RendererConfig};

/// Per-window state owned by the event-loop closure.
///
/// `session` is declared before `window` so the surface it holds is dropped
/// while the window is still alive.
struct WindowState {
    session: RenderSession<WgpuBackend>,
    window: Arc<Window>,
    logical_size: LogicalSize<f64>,
    clock: SystemTimeSource,
    title: String,
    shown_fps: u32,
    budget: FrameBudget,
}

#[derive(Default)]
struct Outcome {
    report: LoopReport,
    fatal: Option<FrameError>,
}

impl WindowState {
    fn handle_resized(&mut self, size: PhysicalSize<u32>) {
        if size.width > 0 && size.height > 0 {
            self.logical_size = size.to_logical(self.window.scale_factor());
        }
        self.session.resize_physical(size);
    }

    fn handle_scale_factor(&mut self, scale_factor: f64) {
        tracing::debug!(scale_factor, "scale factor changed");
        self.session.resize(self.logical_size, scale_factor);
    }

    /// Renders one frame; returns `false` once the loop should stop.
    fn redraw(&mut self, outcome: &RefCell<Outcome>) -> bool {
        let sample = self.clock.sample();
        let frames = outcome.borrow().report.frames();
        if self.budget.exhausted(frames, sample.elapsed) {
            tracing::info!(frames, elapsed = ?sample.elapsed, "frame budget reached");
            return false;
        }

        match self.session.tick(sample.elapsed) {
            Ok(status) => {
                let fps = self.session.fps();
                outcome.borrow_mut().report.record(status, fps);
                if fps != self.shown_fps {
                    self.shown_fps = fps;
                    self.window
                        .set_title(&format!("{} | {fps} fps", self.title));
                }
                true
            }
            Err(err) => {
                outcome.borrow_mut().fatal = Some(err);
                false
            }
        }
    }
}

fn shutdown(token: &CancellationToken, elwt: &EventLoopWindowTarget<()>) {
    token.cancel();
    elwt.exit();
}

/// Opens a window and renders `config` until it is closed, `token` is
/// cancelled, or the frame budget runs out.
pub fn run_windowed(config: RendererConfig, token: CancellationToken) -> Result<LoopReport> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;

    let (width, height) = config.logical_size;
    let logical_size = LogicalSize::new(f64::from(width.max(1)), f64::from(height.max(1)));
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(logical_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let scale_factor = window.scale_factor();
    let inner_size = window.inner_size();
    let backend = WgpuBackend::new(window.as_ref(), inner_size, &config)
        .context("failed to initialise renderer")?;
    // The window manager may not grant the requested size.
    let logical_size: LogicalSize<f64> = inner_size.to_logical(scale_factor);
    let session = RenderSession::new(backend, config.mode, logical_size, scale_factor);
    tracing::info!(
        title = %config.title,
        width = session.extent().width,
        height = session.extent().height,
        scale_factor,
        "window ready"
    );

    let mut state = WindowState {
        session,
        window,
        logical_size,
        clock: SystemTimeSource::new(),
        title: config.title.clone(),
        shown_fps: 0,
        budget: config.budget,
    };
    state.clock.reset();
    state.window.request_redraw();

    let outcome = Rc::new(RefCell::new(Outcome::default()));
    let loop_outcome = Rc::clone(&outcome);
    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                tracing::debug!("window closed");
                shutdown(&token, elwt);
            }
            WindowEvent::Resized(size) => state.handle_resized(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                state.handle_scale_factor(scale_factor);
            }
            WindowEvent::RedrawRequested => {
                if token.is_cancelled() || !state.redraw(&loop_outcome) {
                    shutdown(&token, elwt);
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            if token.is_cancelled() {
                elwt.exit();
            } else {
                state.window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;

    let outcome = outcome.take();
    if let Some(err) = outcome.fatal {
        return Err(anyhow::Error::new(err).context("rendering stopped"));
    }
    tracing::info!(
        presented = outcome.report.presented,
        skipped = outcome.report.skipped,
        fps = outcome.report.fps,
        "render loop finished"
    );
    Ok(outcome.report)
}
