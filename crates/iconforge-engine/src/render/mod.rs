//! GPU rasterization subsystem.
//!
//! One object at a time is drawn into the session's off-screen target with a
//! fixed orthographic camera and a deterministic lighting rig. All ambient
//! pipeline state the rasterizer touches flows through an explicit
//! save/restore scope so host rendering is unaffected by exporter activity.
//!
//! Convention:
//! - mesh geometry lives in unit-box coordinates (centered on the origin)
//! - the camera maps `0..edge` to clip space; the model transform centers and
//!   scales the mesh and flips Y, pairing with the readback row flip

mod ctx;
mod rasterizer;
mod state;

pub mod camera;
pub mod mesh;

pub use ctx::RenderCtx;
pub use rasterizer::Rasterizer;
pub use state::{AmbientScope, AmbientState, TargetBinding};
