//! GPU device + surface management.
//!
//! Responsibilities:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) against a window
//! - acquiring frames (command encoder + presentable view) and submitting them
//!
//! Exactly one `Gpu` exists per window; it is built from an explicit window
//! handle rather than process-global state, so tests and tools can hold
//! independent instances.

mod gpu;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction, classify_surface_error};
