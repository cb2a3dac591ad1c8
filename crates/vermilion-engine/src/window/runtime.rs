use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::QuadRenderer;
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "vermilion".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    exit_requested: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` against a single window until exit.
    ///
    /// Window, GPU, or renderer creation failure terminates the loop with
    /// an error after logging it.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.fatal_error.take() {
            return Err(err);
        }
        Ok(())
    }
}

struct WindowState {
    window: Arc<Window>,
    gpu: Gpu,
    renderer: QuadRenderer,
    clock: FrameClock,
}

impl WindowState {
    fn create(
        event_loop: &ActiveEventLoop,
        config: &RuntimeConfig,
        gpu_init: GpuInit,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window.clone(), gpu_init))
            .context("GPU initialization failed")?;

        let renderer = QuadRenderer::new(gpu.device(), gpu.surface_format())
            .context("renderer initialization failed")?;

        Ok(Self {
            window,
            gpu,
            renderer,
            clock: FrameClock::default(),
        })
    }
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    state: Option<WindowState>,
    fatal_error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            state: None,
            fatal_error: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("fatal: {err:#}");
        self.fatal_error = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn teardown(&mut self) {
        if let Some(mut state) = self.state.take() {
            if let Err(err) = state.renderer.release() {
                log::warn!("renderer teardown: {err:#}");
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match WindowState::create(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw for now; invalidation-based redraw can come
        // later without changing the app contract.
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self
            .state
            .as_ref()
            .is_none_or(|s| s.window.id() != window_id)
        {
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.exit_requested = true;
            self.teardown();
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                self.teardown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(state) = self.state.as_mut() {
                    state.gpu.resize(*new_size);
                    state.window.request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(state) = self.state.as_mut() {
                    let new_size = state.window.inner_size();
                    state.gpu.resize(new_size);
                    state.window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();
                let mut frame_result = Ok(AppControl::Continue);

                if let Some(state) = self.state.as_mut() {
                    let ft: FrameTime = state.clock.tick();

                    let mut ctx = FrameCtx {
                        window: WindowCtx {
                            id: window_id,
                            window: &state.window,
                        },
                        gpu: &mut state.gpu,
                        time: ft,
                        runtime: &mut runtime_ctx,
                        renderer: &mut state.renderer,
                    };

                    frame_result = self.app.on_frame(&mut ctx);
                }

                match frame_result {
                    Ok(AppControl::Continue) => {}
                    Ok(AppControl::Exit) => runtime_ctx.exit(),
                    Err(err) => {
                        self.teardown();
                        self.fail(event_loop, err);
                        return;
                    }
                }

                if runtime_ctx.exit_requested {
                    self.exit_requested = true;
                    self.teardown();
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}
