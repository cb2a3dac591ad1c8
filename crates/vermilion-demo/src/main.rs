//! Quad-batching demo: an animated grid of textured quads.
//!
//! Each grid cell maps a different sub-region of the (virtual) atlas, so
//! the UV-visualising fill makes batching or winding mistakes obvious.

use anyhow::Result;
use winit::dpi::LogicalSize;

use vermilion_engine::coords::Rect;
use vermilion_engine::core::{App, AppControl, FrameCtx, FrameOutcome};
use vermilion_engine::device::GpuInit;
use vermilion_engine::logging::{LoggingConfig, init_logging};
use vermilion_engine::render::Quad;
use vermilion_engine::window::{Runtime, RuntimeConfig};

const GRID_COLS: u32 = 24;
const GRID_ROWS: u32 = 14;

struct Demo {
    elapsed: f32,
}

impl Demo {
    fn new() -> Self {
        Self { elapsed: 0.0 }
    }
}

impl App for Demo {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> Result<AppControl> {
        self.elapsed += ctx.time.dt;
        let t = self.elapsed;

        let (w, h) = ctx.window.logical_size();
        let cell_w = w / GRID_COLS as f32;
        let cell_h = h / GRID_ROWS as f32;

        let outcome = ctx.render(|r| {
            for row in 0..GRID_ROWS {
                for col in 0..GRID_COLS {
                    let phase = (col + row * GRID_COLS) as f32 * 0.11;
                    let pulse = 0.5 + 0.5 * (t * 2.0 + phase).sin();

                    // Shrink each cell around its center by the pulse.
                    let inset_x = cell_w * 0.45 * (1.0 - pulse);
                    let inset_y = cell_h * 0.45 * (1.0 - pulse);
                    let rect = Rect::new(
                        col as f32 * cell_w + inset_x,
                        row as f32 * cell_h + inset_y,
                        cell_w - 2.0 * inset_x,
                        cell_h - 2.0 * inset_y,
                    );

                    // Each cell samples its own tile of the atlas.
                    let uv = Rect::new(
                        col as f32 / GRID_COLS as f32,
                        row as f32 / GRID_ROWS as f32,
                        1.0 / GRID_COLS as f32,
                        1.0 / GRID_ROWS as f32,
                    );

                    r.draw(Quad::with_uv(rect, uv));
                }
            }
        })?;

        if let FrameOutcome::Drawn { quads } = outcome {
            if ctx.time.frame_index % 300 == 0 {
                log::info!(
                    "frame {}: {} quads, dt {:.2} ms",
                    ctx.time.frame_index,
                    quads,
                    ctx.time.dt * 1000.0
                );
            }
        }

        Ok(AppControl::Continue)
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "vermilion demo".to_string(),
        initial_size: LogicalSize::new(1024.0, 640.0),
    };

    Runtime::run(config, GpuInit::default(), Demo::new())
}
