//! Iconforge engine crate.
//!
//! Headless GPU rasterizer that renders inventory objects into individual
//! PNG icons: off-screen targets, async readback, and a bounded writer pool.

pub mod device;
pub mod error;
pub mod export;
pub mod logging;
pub mod object;
pub mod readback;
pub mod render;
