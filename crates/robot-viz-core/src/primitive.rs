//! Primitive geometry generators
//!
//! Triangle meshes for URDF primitive shapes and markers, and line-segment
//! sets for coordinate triads and cross markers. All generators work in
//! single precision except the line helpers, which keep full precision so
//! their endpoints can be compared against kinematics results.

use std::f32::consts::PI;

use glam::{DQuat, DVec3};

use crate::mesh::TriMesh;

/// Default tessellation around the revolution axis
pub const DEFAULT_SEGMENTS: u32 = 24;

/// Arrow proportions for a unit-length arrow along +X
pub const ARROW_TIP_LENGTH: f32 = 0.25;
pub const ARROW_TIP_RADIUS: f32 = 0.1;
pub const ARROW_SHAFT_RADIUS: f32 = 0.05;

/// A line segment with full-precision endpoints
pub type Segment = [DVec3; 2];

/// Generate an axis-aligned box centered at the origin
pub fn generate_box_mesh(size: [f32; 3]) -> TriMesh {
    let h = [size[0] / 2.0, size[1] / 2.0, size[2] / 2.0];

    // Four corners per face, wound counter-clockwise seen from outside
    let faces: [[[f32; 3]; 4]; 6] = [
        [[1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0]],
        [[-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0]],
        [[1.0, 1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
        [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0]],
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in &faces {
        let base = vertices.len() as u32;
        for corner in face {
            vertices.push([corner[0] * h[0], corner[1] * h[1], corner[2] * h[2]]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    TriMesh { vertices, indices }
}

/// Generate a cylinder along Z centered at the origin (URDF convention)
pub fn generate_cylinder_mesh(radius: f32, length: f32) -> TriMesh {
    let half = length / 2.0;
    lathe(
        &[(0.0, -half), (radius, -half), (radius, half), (0.0, half)],
        DEFAULT_SEGMENTS,
    )
}

/// Generate a sphere centered at the origin
pub fn generate_sphere_mesh(radius: f32) -> TriMesh {
    let (vertices, indices) = generate_sphere(16, 12);
    let vertices = vertices
        .into_iter()
        .map(|v| [v[0] * radius, v[1] * radius, v[2] * radius])
        .collect();
    TriMesh { vertices, indices }
}

/// Generate a unit-length arrow from the origin to +X
pub fn generate_arrow_mesh() -> TriMesh {
    let shaft_end = 1.0 - ARROW_TIP_LENGTH;
    let along_z = lathe(
        &[
            (0.0, 0.0),
            (ARROW_SHAFT_RADIUS, 0.0),
            (ARROW_SHAFT_RADIUS, shaft_end),
            (ARROW_TIP_RADIUS, shaft_end),
            (0.0, 1.0),
        ],
        DEFAULT_SEGMENTS,
    );

    // Cyclic axis permutation (x, y, z) -> (z, x, y) turns +Z into +X
    let vertices = along_z
        .vertices
        .into_iter()
        .map(|v| [v[2], v[0], v[1]])
        .collect();
    TriMesh {
        vertices,
        indices: along_z.indices,
    }
}

/// The three segments of a coordinate triad (X, Y, Z order)
pub fn axes_segments(origin: DVec3, rotation: DQuat, scale: f64) -> [Segment; 3] {
    [DVec3::X, DVec3::Y, DVec3::Z].map(|axis| [origin, origin + rotation * (axis * scale)])
}

/// Three axis-aligned segments of length `size` crossing at `center`
pub fn cross_segments(center: DVec3, size: f64) -> [Segment; 3] {
    let half = size / 2.0;
    [DVec3::X, DVec3::Y, DVec3::Z].map(|axis| [center - axis * half, center + axis * half])
}

/// Surface of revolution around Z.
///
/// `profile` lists `(radius, z)` points from bottom to top; a zero radius
/// collapses to a single pole vertex, which closes the surface.
fn lathe(profile: &[(f32, f32)], segments: u32) -> TriMesh {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    // First vertex index and vertex count of each profile ring
    let mut rings: Vec<(u32, u32)> = Vec::with_capacity(profile.len());
    for &(radius, z) in profile {
        let start = vertices.len() as u32;
        if radius == 0.0 {
            vertices.push([0.0, 0.0, z]);
            rings.push((start, 1));
        } else {
            for seg in 0..segments {
                let theta = 2.0 * PI * seg as f32 / segments as f32;
                vertices.push([radius * theta.cos(), radius * theta.sin(), z]);
            }
            rings.push((start, segments));
        }
    }

    let at = |ring: (u32, u32), seg: u32| {
        if ring.1 == 1 {
            ring.0
        } else {
            ring.0 + seg % segments
        }
    };

    for pair in rings.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if lower.1 == 1 && upper.1 == 1 {
            continue;
        }
        for seg in 0..segments {
            let a0 = at(lower, seg);
            let a1 = at(lower, seg + 1);
            let b0 = at(upper, seg);
            let b1 = at(upper, seg + 1);
            if lower.1 != 1 {
                indices.extend_from_slice(&[a0, a1, b1]);
            }
            if upper.1 != 1 {
                indices.extend_from_slice(&[a0, b1, b0]);
            }
        }
    }

    TriMesh { vertices, indices }
}

/// Generate a unit sphere mesh
fn generate_sphere(segments: u32, rings: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let z = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let y = ring_radius * theta.sin();

            vertices.push([x, y, z]);
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;

            indices.push(current);
            indices.push(next);
            indices.push(current + 1);

            indices.push(current + 1);
            indices.push(next);
            indices.push(next + 1);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_indices_valid(mesh: &TriMesh) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_box_mesh_bounds() {
        let mesh = generate_box_mesh([1.0, 2.0, 3.0]);
        assert_eq!(mesh.triangle_count(), 12);
        assert_indices_valid(&mesh);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, [-0.5, -1.0, -1.5]);
        assert_eq!(max, [0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_cylinder_is_closed_along_z() {
        let mesh = generate_cylinder_mesh(0.5, 2.0);
        assert_indices_valid(&mesh);
        // Two caps (fans) and the side (two triangles per segment)
        assert_eq!(mesh.triangle_count(), 4 * DEFAULT_SEGMENTS as usize);
        let (min, max) = mesh.bounds().unwrap();
        assert_abs_diff_eq!(min[2], -1.0);
        assert_abs_diff_eq!(max[2], 1.0);
        assert_abs_diff_eq!(max[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_cylinder_side_faces_outward() {
        let mesh = generate_cylinder_mesh(1.0, 1.0);
        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (glam::Vec3::from(a), glam::Vec3::from(b), glam::Vec3::from(c));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            if normal.length() > 1e-6 {
                assert!(normal.dot(centroid) > 0.0);
            }
        }
    }

    #[test]
    fn test_arrow_points_along_x() {
        let mesh = generate_arrow_mesh();
        assert_indices_valid(&mesh);
        let (min, max) = mesh.bounds().unwrap();
        assert_abs_diff_eq!(min[0], 0.0);
        assert_abs_diff_eq!(max[0], 1.0);
        assert_abs_diff_eq!(max[1], ARROW_TIP_RADIUS, epsilon = 1e-6);
    }

    #[test]
    fn test_sphere_radius() {
        let mesh = generate_sphere_mesh(0.25);
        assert_indices_valid(&mesh);
        for v in &mesh.vertices {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert_abs_diff_eq!(r, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_axes_segments_identity() {
        let origin = DVec3::new(1.0, 2.0, 3.0);
        let segments = axes_segments(origin, DQuat::IDENTITY, 0.5);
        assert_eq!(segments[0], [origin, DVec3::new(1.5, 2.0, 3.0)]);
        assert_eq!(segments[1], [origin, DVec3::new(1.0, 2.5, 3.0)]);
        assert_eq!(segments[2], [origin, DVec3::new(1.0, 2.0, 3.5)]);
    }

    #[test]
    fn test_cross_segments_centered() {
        let center = DVec3::new(0.0, 0.0, 1.0);
        for [a, b] in cross_segments(center, 0.2) {
            assert!(((a + b) / 2.0).abs_diff_eq(center, 1e-12));
            assert_abs_diff_eq!(a.distance(b), 0.2, epsilon = 1e-12);
        }
    }
}
