//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue (headless, no surface)
//! - pumping the device so map-async callbacks fire
//! - the off-screen color+depth target pair used by an export session

mod gpu;
mod target;

pub use gpu::{Gpu, GpuInit};
pub use target::{COLOR_FORMAT, DEPTH_FORMAT, FrameResources};
