//! Primitive mesh generation for URDF geometry types

use std::f32::consts::PI;

use crate::mesh::MeshSource;

const CYLINDER_SEGMENTS: u32 = 32;
const SPHERE_SEGMENTS: u32 = 24;
const SPHERE_RINGS: u32 = 16;

/// Generate an axis-aligned box centered at the origin.
///
/// `size` is the full extent on each axis, URDF convention.
pub fn generate_box(size: [f32; 3]) -> MeshSource {
    let hx = size[0] / 2.0;
    let hy = size[1] / 2.0;
    let hz = size[2] / 2.0;

    let mut mesh = MeshSource::default();

    // 4 vertices per face so each face keeps its own flat normal
    let mut add_face = |corners: [[f32; 3]; 4], normal: [f32; 3]| {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend_from_slice(&corners);
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        mesh.normals.push(normal);
        mesh.normals.push(normal);
    };

    add_face(
        [[hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz], [hx, -hy, hz]],
        [1.0, 0.0, 0.0],
    );
    add_face(
        [[-hx, hy, -hz], [-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz]],
        [-1.0, 0.0, 0.0],
    );
    add_face(
        [[hx, hy, -hz], [-hx, hy, -hz], [-hx, hy, hz], [hx, hy, hz]],
        [0.0, 1.0, 0.0],
    );
    add_face(
        [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]],
        [0.0, -1.0, 0.0],
    );
    add_face(
        [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]],
        [0.0, 0.0, 1.0],
    );
    add_face(
        [[-hx, hy, -hz], [hx, hy, -hz], [hx, -hy, -hz], [-hx, -hy, -hz]],
        [0.0, 0.0, -1.0],
    );

    mesh
}

/// Generate a cylinder along the Z axis, centered at the origin, with end
/// caps. URDF convention: `length` is the full height.
pub fn generate_cylinder(radius: f32, length: f32) -> MeshSource {
    let half = length / 2.0;
    let mut mesh = MeshSource::default();

    // Side wall: two rings of vertices
    let ring_base = mesh.vertices.len() as u32;
    for i in 0..CYLINDER_SEGMENTS {
        let angle = 2.0 * PI * i as f32 / CYLINDER_SEGMENTS as f32;
        let (sin, cos) = angle.sin_cos();
        mesh.vertices.push([radius * cos, radius * sin, -half]);
        mesh.vertices.push([radius * cos, radius * sin, half]);
    }
    for i in 0..CYLINDER_SEGMENTS {
        let next = (i + 1) % CYLINDER_SEGMENTS;
        let b0 = ring_base + i * 2;
        let b1 = ring_base + next * 2;
        mesh.indices.extend_from_slice(&[b0, b1, b1 + 1, b0, b1 + 1, b0 + 1]);

        let angle = 2.0 * PI * (i as f32 + 0.5) / CYLINDER_SEGMENTS as f32;
        let normal = [angle.cos(), angle.sin(), 0.0];
        mesh.normals.push(normal);
        mesh.normals.push(normal);
    }

    // Caps: triangle fans around center vertices
    for &(z, normal_z) in &[(half, 1.0_f32), (-half, -1.0_f32)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push([0.0, 0.0, z]);
        let rim = mesh.vertices.len() as u32;
        for i in 0..CYLINDER_SEGMENTS {
            let angle = 2.0 * PI * i as f32 / CYLINDER_SEGMENTS as f32;
            mesh.vertices.push([radius * angle.cos(), radius * angle.sin(), z]);
        }
        for i in 0..CYLINDER_SEGMENTS {
            let next = (i + 1) % CYLINDER_SEGMENTS;
            if normal_z > 0.0 {
                mesh.indices.extend_from_slice(&[center, rim + i, rim + next]);
            } else {
                mesh.indices.extend_from_slice(&[center, rim + next, rim + i]);
            }
            mesh.normals.push([0.0, 0.0, normal_z]);
        }
    }

    mesh
}

/// Generate a UV sphere centered at the origin
pub fn generate_sphere(radius: f32) -> MeshSource {
    let mut mesh = MeshSource::default();

    for ring in 0..=SPHERE_RINGS {
        let phi = PI * ring as f32 / SPHERE_RINGS as f32;
        for seg in 0..=SPHERE_SEGMENTS {
            let theta = 2.0 * PI * seg as f32 / SPHERE_SEGMENTS as f32;
            mesh.vertices.push([
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            ]);
        }
    }

    let stride = SPHERE_SEGMENTS + 1;
    for ring in 0..SPHERE_RINGS {
        for seg in 0..SPHERE_SEGMENTS {
            let a = ring * stride + seg;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, b + 1, a, b + 1, a + 1]);
        }
    }

    mesh.normals = crate::mesh::face_normals(&mesh.vertices, &mesh.indices);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh() {
        let mesh = generate_box([2.0, 4.0, 6.0]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.normals.len(), 12);
        // All vertices inside the half extents
        for v in &mesh.vertices {
            assert!(v[0].abs() <= 1.0 && v[1].abs() <= 2.0 && v[2].abs() <= 3.0);
        }
    }

    #[test]
    fn test_cylinder_mesh() {
        let mesh = generate_cylinder(0.5, 2.0);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert_eq!(mesh.normals.len(), mesh.indices.len() / 3);
        for v in &mesh.vertices {
            assert!(v[2].abs() <= 1.0 + 1e-6);
            assert!((v[0] * v[0] + v[1] * v[1]).sqrt() <= 0.5 + 1e-5);
        }
    }

    #[test]
    fn test_sphere_mesh() {
        let mesh = generate_sphere(1.0);
        assert_eq!(mesh.indices.len() % 3, 0);
        assert_eq!(mesh.normals.len(), mesh.indices.len() / 3);
        for v in &mesh.vertices {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 1.0).abs() < 1e-5);
        }
    }
}
