//! The quad-batching render core.
//!
//! Data flow per frame:
//! - [`QuadBatch`] accumulates draw requests into CPU vertex/index arrays
//! - [`QuadBuffers`] stages those arrays through a transfer buffer into
//!   GPU-resident vertex/index buffers, growing them when a frame needs more
//! - [`QuadRenderer`] owns the pipeline and records the clear + single
//!   indexed draw call into the frame's command encoder
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The vertex shader converts to NDC using a viewport uniform.

mod batch;
mod buffers;
mod quad;
mod renderer;

pub use batch::QuadBatch;
pub use buffers::{BufferBudget, INITIAL_QUAD_CAPACITY, QuadBuffers};
pub use quad::{INDICES_PER_QUAD, Quad, VERTICES_PER_QUAD, Vertex};
pub use renderer::{CLEAR_COLOR, QuadRenderer};
