use anyhow::{Result, anyhow};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::QuadRenderer;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }
}

/// Result of a frame attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented.
    Drawn { quads: u32 },
    /// The surface was unavailable; the frame was dropped without drawing.
    Skipped,
}

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,

    pub(crate) renderer: &'a mut QuadRenderer,
}

impl<'a> FrameCtx<'a> {
    /// Acquires a surface texture, calls `draw` with the quad renderer,
    /// then flushes the batch and presents the frame.
    ///
    /// A transiently unavailable surface skips the frame and returns
    /// [`FrameOutcome::Skipped`]; queued quads are discarded so the next
    /// frame starts clean. Unrecoverable surface loss is an error.
    pub fn render<F>(&mut self, draw: F) -> Result<FrameOutcome>
    where
        F: FnOnce(&mut QuadRenderer),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    return Err(anyhow!("surface is permanently unavailable"));
                }
                log::debug!("frame skipped: surface not ready ({action:?})");
                self.renderer.discard_batch();
                return Ok(FrameOutcome::Skipped);
            }
        };

        draw(self.renderer);

        let (w, h) = self.window.logical_size();
        let quads = self.renderer.render(
            self.gpu.device(),
            self.gpu.queue(),
            &mut frame.encoder,
            &frame.view,
            Viewport::new(w, h),
        )?;

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        Ok(FrameOutcome::Drawn { quads })
    }
}
