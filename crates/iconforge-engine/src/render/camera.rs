//! Fixed orthographic camera for icon rendering.
//!
//! Every export uses the same projection and model transform so rendering the
//! same object at the same size is byte-identical across runs.

use glam::{Mat4, Vec3};

/// Depth half-range; generous so scaled-up meshes never clip.
const DEPTH_RANGE: f32 = 1000.0;

/// Z offset keeping the mesh comfortably inside the depth range.
const MODEL_Z: f32 = 100.0;

/// Orthographic projection spanning `0..edge` on both axes.
///
/// No perspective foreshortening; near/far at ±[`DEPTH_RANGE`].
pub fn projection(edge: u32) -> Mat4 {
    let e = edge as f32;
    Mat4::orthographic_rh(0.0, e, 0.0, e, -DEPTH_RANGE, DEPTH_RANGE)
}

/// Model transform for unit-box meshes: center in the target, scale to the
/// full edge, flip Y.
///
/// The Y flip pairs with the readback row flip so the mesh's +Y-up
/// convention ends up in image row order.
pub fn model_transform(edge: u32) -> Mat4 {
    let e = edge as f32;
    Mat4::from_translation(Vec3::new(e / 2.0, e / 2.0, MODEL_Z))
        * Mat4::from_scale(Vec3::new(e, -e, e))
}

/// Combined view-projection·model matrix for one object at `edge`.
pub fn object_matrix(projection: Mat4, edge: u32) -> Mat4 {
    projection * model_transform(edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_deterministic() {
        assert_eq!(projection(64), projection(64));
        assert_eq!(model_transform(256), model_transform(256));
    }

    #[test]
    fn projection_maps_target_corners_to_clip_corners() {
        let p = projection(64);
        let lo = p.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let hi = p.project_point3(Vec3::new(64.0, 64.0, 0.0));
        assert!((lo.x - -1.0).abs() < 1e-6 && (lo.y - -1.0).abs() < 1e-6);
        assert!((hi.x - 1.0).abs() < 1e-6 && (hi.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unit_box_fills_the_target() {
        // A unit-box corner at (±0.5, ±0.5) must land on the target edges.
        let m = object_matrix(projection(128), 128);
        let corner = m.project_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        // Y flip: mesh +Y maps to clip -Y.
        assert!((corner.y - -1.0).abs() < 1e-5);
    }

    #[test]
    fn mesh_depth_stays_inside_clip_range() {
        let m = object_matrix(projection(1024), 1024);
        for z in [-0.5, 0.0, 0.5] {
            let p = m.project_point3(Vec3::new(0.0, 0.0, z));
            assert!((0.0..=1.0).contains(&p.z), "z={z} mapped to {}", p.z);
        }
    }
}
