//! CPU-side icon geometry.
//!
//! Meshes live in unit-box coordinates: centered on the origin, roughly
//! within ±0.5 per axis. The camera's model transform scales them to the
//! target edge.

use bytemuck::{Pod, Zeroable};

/// GPU vertex for icon meshes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct IconVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl IconVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x4  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<IconVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle geometry for one icon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconMesh {
    pub vertices: Vec<IconVertex>,
    pub indices: Vec<u16>,
}

impl IconMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Flat sprite quad facing the camera. Pairs with the `Flat` lighting
    /// profile: the vertex color passes through unshaded.
    pub fn sprite_quad(color: [f32; 4]) -> Self {
        let n = [0.0, 0.0, 1.0];
        let vertices = vec![
            IconVertex { position: [-0.5, -0.5, 0.0], normal: n, color },
            IconVertex { position: [0.5, -0.5, 0.0], normal: n, color },
            IconVertex { position: [0.5, 0.5, 0.0], normal: n, color },
            IconVertex { position: [-0.5, 0.5, 0.0], normal: n, color },
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Self { vertices, indices }
    }

    /// Axis-aligned cube with per-face normals. Pairs with the `Shaded`
    /// lighting profile (the multi-axis rig).
    pub fn cube(color: [f32; 4]) -> Self {
        // (normal, four corners). Corners wound consistently per face;
        // culling is off so winding only matters for normals.
        const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // +Z
            (
                [0.0, 0.0, 1.0],
                [
                    [-0.5, -0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                ],
            ),
            // -Z
            (
                [0.0, 0.0, -1.0],
                [
                    [0.5, -0.5, -0.5],
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, -0.5],
                ],
            ),
            // +X
            (
                [1.0, 0.0, 0.0],
                [
                    [0.5, -0.5, 0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            // -X
            (
                [-1.0, 0.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            // +Y
            (
                [0.0, 1.0, 0.0],
                [
                    [-0.5, 0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            // -Y
            (
                [0.0, -1.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                ],
            ),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in FACES {
            let base = vertices.len() as u16;
            for position in corners {
                vertices.push(IconVertex {
                    position,
                    normal,
                    color,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_quad_shape() {
        let quad = IconMesh::sprite_quad([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices.len(), 6);
        assert!(!quad.is_empty());
    }

    #[test]
    fn cube_shape_and_bounds() {
        let cube = IconMesh::cube([1.0; 4]);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            for c in v.position {
                assert!(c.abs() <= 0.5);
            }
        }
        // All indices address real vertices.
        assert!(cube.indices.iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn cube_face_normals_are_unit_axes() {
        let cube = IconMesh::cube([1.0; 4]);
        for v in &cube.vertices {
            let len2: f32 = v.normal.iter().map(|c| c * c).sum();
            assert!((len2 - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn default_mesh_is_empty() {
        assert!(IconMesh::default().is_empty());
    }
}
