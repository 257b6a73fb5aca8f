/// Lens distortion meshes.
///
/// The compositor draws each eye's render target through a screen-space
/// grid whose vertices carry pre-distorted view tangents per color channel.
/// The grid itself is uniform in NDC; the barrel distortion lives in the
/// tangent attributes, so changing coefficients never re-tessellates.
use bytemuck::{Pod, Zeroable};

use crate::hmd::runtime::EyeFov;
use crate::render::{Geometry, VertexAttribute};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DistortionVertex {
    /// Position over the full framebuffer, in [-1, 1] on both axes.
    pub screen_pos_ndc: [f32; 2],
    /// Lerp factor between the two timewarp matrices.
    pub timewarp_factor: f32,
    /// Edge fade, 1 at the lens center and 0 at the rim.
    pub vignette_factor: f32,
    pub tan_eye_angles_r: [f32; 2],
    pub tan_eye_angles_g: [f32; 2],
    pub tan_eye_angles_b: [f32; 2],
}

pub const DISTORTION_VERTEX_STRIDE: u32 = std::mem::size_of::<DistortionVertex>() as u32;

pub const DISTORTION_VERTEX_ATTRIBUTES: [VertexAttribute; 6] = [
    VertexAttribute {
        name: "screenPosNDC",
        components: 2,
        offset: 0,
    },
    VertexAttribute {
        name: "timeWarpFactor",
        components: 1,
        offset: 8,
    },
    VertexAttribute {
        name: "vignetteFactor",
        components: 1,
        offset: 12,
    },
    VertexAttribute {
        name: "tanEyeAnglesR",
        components: 2,
        offset: 16,
    },
    VertexAttribute {
        name: "tanEyeAnglesG",
        components: 2,
        offset: 24,
    },
    VertexAttribute {
        name: "tanEyeAnglesB",
        components: 2,
        offset: 32,
    },
];

#[derive(Debug, Clone)]
pub struct DistortionMesh {
    pub vertices: Vec<DistortionVertex>,
    pub indices: Vec<u16>,
}

impl DistortionMesh {
    pub fn to_geometry(&self) -> Geometry {
        Geometry {
            vertex_data: bytemuck::cast_slice(&self.vertices).to_vec(),
            vertex_stride: DISTORTION_VERTEX_STRIDE,
            attributes: DISTORTION_VERTEX_ATTRIBUTES.to_vec(),
            indices: self.indices.clone(),
        }
    }
}

/// Radial barrel distortion: maps an undistorted radius to the distorted
/// one through the device's polynomial.
pub fn distort_radius(r: f32, k: &[f32; 4]) -> f32 {
    let r2 = r * r;
    let r4 = r2 * r2;
    let r6 = r4 * r2;

    r * (k[0] + r2 * k[1] + r4 * k[2] + r6 * k[3])
}

/// Tessellate one eye's distortion grid. `segments` cells per axis,
/// at most 255 so indices stay 16-bit.
pub fn build_distortion_grid(fov: EyeFov, k: [f32; 4], segments: u32) -> DistortionMesh {
    debug_assert!((1..=255).contains(&segments));

    let half_fov_x = 0.5 * (fov.left_tan + fov.right_tan);
    let half_fov_y = 0.5 * (fov.up_tan + fov.down_tan);

    let side = segments + 1;
    let mut vertices = Vec::with_capacity((side * side) as usize);
    for row in 0..side {
        for col in 0..side {
            let ndc_x = col as f32 / segments as f32 * 2.0 - 1.0;
            let ndc_y = row as f32 / segments as f32 * 2.0 - 1.0;
            let r = (ndc_x * ndc_x + ndc_y * ndc_y).sqrt();
            let scale = if r > 0.0 {
                distort_radius(r, &k) / r
            } else {
                k[0]
            };

            let tan = [ndc_x * half_fov_x * scale, ndc_y * half_fov_y * scale];
            vertices.push(DistortionVertex {
                screen_pos_ndc: [ndc_x, ndc_y],
                timewarp_factor: ndc_y * 0.5 + 0.5,
                vignette_factor: (1.0 - r).clamp(0.0, 1.0),
                tan_eye_angles_r: tan,
                tan_eye_angles_g: tan,
                tan_eye_angles_b: tan,
            });
        }
    }

    let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
    for row in 0..segments {
        for col in 0..segments {
            let i0 = (row * side + col) as u16;
            let i1 = i0 + 1;
            let i2 = i0 + side as u16;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    DistortionMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_fov(tan: f32) -> EyeFov {
        EyeFov {
            up_tan: tan,
            down_tan: tan,
            left_tan: tan,
            right_tan: tan,
        }
    }

    #[test]
    fn test_identity_coefficients_leave_tangents_linear() {
        let mesh = build_distortion_grid(symmetric_fov(1.0), [1.0, 0.0, 0.0, 0.0], 4);

        for vertex in &mesh.vertices {
            assert!((vertex.tan_eye_angles_g[0] - vertex.screen_pos_ndc[0]).abs() < 1e-6);
            assert!((vertex.tan_eye_angles_g[1] - vertex.screen_pos_ndc[1]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_grid_counts_and_bounds() {
        let mesh = build_distortion_grid(symmetric_fov(1.2), [1.0, 0.22, 0.24, 0.0], 16);

        assert_eq!(mesh.vertices.len(), 17 * 17);
        assert_eq!(mesh.indices.len(), 16 * 16 * 6);
        for vertex in &mesh.vertices {
            assert!(vertex.screen_pos_ndc[0].abs() <= 1.0 + 1e-6);
            assert!(vertex.screen_pos_ndc[1].abs() <= 1.0 + 1e-6);
            assert!((0.0..=1.0).contains(&vertex.vignette_factor));
        }
        for &index in &mesh.indices {
            assert!((index as usize) < mesh.vertices.len());
        }
    }

    #[test]
    fn test_distortion_grows_with_radius() {
        let k = [1.0, 0.22, 0.24, 0.0];
        assert!(distort_radius(0.5, &k) > 0.5);
        assert!(distort_radius(1.0, &k) > distort_radius(0.5, &k));
    }

    #[test]
    fn test_center_vertex_is_unvignetted() {
        let mesh = build_distortion_grid(symmetric_fov(1.0), [1.0, 0.22, 0.24, 0.0], 4);

        let center = mesh
            .vertices
            .iter()
            .find(|v| v.screen_pos_ndc == [0.0, 0.0])
            .expect("grid with even segments has a center vertex");
        assert_eq!(center.vignette_factor, 1.0);
        assert_eq!(center.tan_eye_angles_g, [0.0, 0.0]);
    }

    #[test]
    fn test_geometry_layout_matches_vertex_struct() {
        let mesh = build_distortion_grid(symmetric_fov(1.0), [1.0, 0.0, 0.0, 0.0], 2);
        let geometry = mesh.to_geometry();

        assert_eq!(DISTORTION_VERTEX_STRIDE, 40);
        assert_eq!(
            geometry.vertex_data.len(),
            mesh.vertices.len() * DISTORTION_VERTEX_STRIDE as usize
        );
        assert_eq!(geometry.vertex_count(), mesh.vertices.len());
        assert_eq!(geometry.triangle_count(), mesh.indices.len() / 3);

        let last = DISTORTION_VERTEX_ATTRIBUTES
            .last()
            .expect("attribute table is not empty");
        assert_eq!(last.offset + last.components * 4, DISTORTION_VERTEX_STRIDE);
    }
}
