//! Ray picking against robot part meshes
//!
//! Pure geometry, no GPU state: the viewport builds a ray with
//! [`crate::Camera::screen_to_ray`] and tests it against each part's
//! triangles, with an AABB prefilter.

use glam::{Mat4, Vec3};
use uuid::Uuid;

use viewer_core::VisualPart;

/// Result of a successful pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub part: Uuid,
    /// World-space distance from the ray origin to the hit point
    pub distance: f32,
}

/// Find the closest part hit by a world-space ray.
///
/// `parts` supplies each candidate with its current world transform.
pub fn pick_part<'a>(
    ray_origin: Vec3,
    ray_dir: Vec3,
    parts: impl Iterator<Item = (Uuid, Mat4, &'a VisualPart)>,
) -> Option<PickHit> {
    let mut closest: Option<PickHit> = None;

    for (id, world, part) in parts {
        // Test in the part's local space; world transforms are rigid so
        // the inverse is exact.
        let inv = world.inverse();
        let local_origin = inv.transform_point3(ray_origin);
        let local_dir = inv.transform_vector3(ray_dir).normalize_or_zero();
        if local_dir == Vec3::ZERO {
            continue;
        }

        if ray_aabb_intersection(
            local_origin,
            local_dir,
            Vec3::from(part.bbox_min),
            Vec3::from(part.bbox_max),
        )
        .is_none()
        {
            continue;
        }

        if let Some(t) = ray_mesh_intersection(local_origin, local_dir, part) {
            let hit_world = world.transform_point3(local_origin + local_dir * t);
            let distance = (hit_world - ray_origin).length();
            if closest.is_none_or(|c| distance < c.distance) {
                closest = Some(PickHit { part: id, distance });
            }
        }
    }

    closest
}

/// Ray-AABB intersection (slab method).
///
/// Returns the entry parameter, or None on a miss. A ray starting inside
/// the box counts as a hit at t = 0.
pub fn ray_aabb_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    box_min: Vec3,
    box_max: Vec3,
) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        if dir.abs() < 1e-9 {
            if origin < box_min[axis] || origin > box_max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t0 = (box_min[axis] - origin) * inv;
        let t1 = (box_max[axis] - origin) * inv;
        let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    Some(t_min.max(0.0))
}

/// Closest ray-triangle intersection over a part's index buffer
fn ray_mesh_intersection(ray_origin: Vec3, ray_dir: Vec3, part: &VisualPart) -> Option<f32> {
    let mut closest: Option<f32> = None;

    for chunk in part.indices.chunks(3) {
        if chunk.len() != 3 {
            continue;
        }
        let v0 = Vec3::from(part.vertices[chunk[0] as usize]);
        let v1 = Vec3::from(part.vertices[chunk[1] as usize]);
        let v2 = Vec3::from(part.vertices[chunk[2] as usize]);

        if let Some(t) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2)
            && closest.is_none_or(|c| t < c)
        {
            closest = Some(t);
        }
    }

    closest
}

/// Moller-Trumbore ray-triangle intersection, both-sided.
///
/// Returns the ray parameter at the hit, or None.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);

    // Parallel to the triangle plane
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > EPSILON { Some(t) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_core::scene::NodeId;

    fn unit_box_part() -> VisualPart {
        let mesh = viewer_core::primitive::generate_box([1.0, 1.0, 1.0]);
        let mut part = VisualPart::new("box", NodeId(0));
        part.vertices = mesh.vertices;
        part.normals = mesh.normals;
        part.indices = mesh.indices;
        part.calculate_bounding_box();
        part
    }

    #[test]
    fn test_ray_hits_aabb() {
        let t = ray_aabb_intersection(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::splat(-0.5),
            Vec3::splat(0.5),
        );
        assert_eq!(t, Some(4.5));
    }

    #[test]
    fn test_ray_misses_aabb() {
        let t = ray_aabb_intersection(
            Vec3::new(2.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::splat(-0.5),
            Vec3::splat(0.5),
        );
        assert_eq!(t, None);
    }

    #[test]
    fn test_ray_behind_aabb() {
        let t = ray_aabb_intersection(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::splat(-0.5),
            Vec3::splat(0.5),
        );
        assert_eq!(t, None);
    }

    #[test]
    fn test_ray_inside_aabb() {
        let t = ray_aabb_intersection(
            Vec3::ZERO,
            Vec3::X,
            Vec3::splat(-0.5),
            Vec3::splat(0.5),
        );
        assert_eq!(t, Some(0.0));
    }

    #[test]
    fn test_ray_triangle_hit() {
        let t = ray_triangle_intersection(
            Vec3::new(0.25, 0.25, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
        );
        assert!((t.unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_triangle_miss_outside() {
        let t = ray_triangle_intersection(
            Vec3::new(0.9, 0.9, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
        );
        assert_eq!(t, None);
    }

    #[test]
    fn test_pick_closest_of_two() {
        let part_near = unit_box_part();
        let part_far = unit_box_part();
        let near_id = part_near.id;

        let candidates = [
            (part_near.id, Mat4::IDENTITY, &part_near),
            (part_far.id, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)), &part_far),
        ];

        let hit = pick_part(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            candidates.iter().map(|(id, m, p)| (*id, *m, *p)),
        )
        .unwrap();
        assert_eq!(hit.part, near_id);
        assert!((hit.distance - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_pick_respects_world_transform() {
        let part = unit_box_part();
        let world = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));

        // Ray down the original origin misses the moved box
        let miss = pick_part(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            std::iter::once((part.id, world, &part)),
        );
        assert!(miss.is_none());

        let hit = pick_part(
            Vec3::new(3.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            std::iter::once((part.id, world, &part)),
        );
        assert!(hit.is_some());
    }
}
