//! Vermilion engine crate.
//!
//! A 2D quad-batching renderer: draw requests accumulate into CPU-side
//! vertex/index arrays, get staged into GPU buffers once per frame, and are
//! drawn with a single indexed draw call before presentation.

pub mod core;
pub mod device;
pub mod window;
pub mod time;

pub mod logging;
pub mod coords;
pub mod render;
