//! Robot model: joints and visual parts

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::{NodeId, NodeKind, SceneNode};

/// URDF joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JointType {
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
    Floating,
    Planar,
}

impl JointType {
    /// Whether this joint has a single scalar degree of freedom the viewer
    /// can drive.
    pub fn has_dof(&self) -> bool {
        matches!(
            self,
            JointType::Revolute | JointType::Continuous | JointType::Prismatic
        )
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            JointType::Fixed => "Fixed",
            JointType::Revolute => "Revolute",
            JointType::Continuous => "Continuous",
            JointType::Prismatic => "Prismatic",
            JointType::Floating => "Floating",
            JointType::Planar => "Planar",
        }
    }
}

impl From<&urdf_rs::JointType> for JointType {
    fn from(urdf_type: &urdf_rs::JointType) -> Self {
        match urdf_type {
            urdf_rs::JointType::Fixed => JointType::Fixed,
            urdf_rs::JointType::Revolute => JointType::Revolute,
            urdf_rs::JointType::Continuous => JointType::Continuous,
            urdf_rs::JointType::Prismatic => JointType::Prismatic,
            urdf_rs::JointType::Floating => JointType::Floating,
            urdf_rs::JointType::Planar => JointType::Planar,
            urdf_rs::JointType::Spherical => JointType::Floating, // Approximate as floating
        }
    }
}

/// Joint position limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower position limit (rad or m)
    pub lower: f32,
    /// Upper position limit (rad or m)
    pub upper: f32,
}

impl JointLimits {
    pub fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Clamp a candidate position into the limit range
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.lower, self.upper)
    }
}

/// A single articulated joint of the loaded robot.
///
/// The current value is mutated only through [`RobotModel::set_joint_value`],
/// which clamps against the limits, so `lower <= value <= upper` holds
/// whenever limits exist.
#[derive(Debug, Clone)]
pub struct JointState {
    pub name: String,
    pub joint_type: JointType,
    /// Rotation/translation axis in the joint's local frame (unit vector)
    pub axis: Vec3,
    /// None for continuous joints (unbounded)
    pub limits: Option<JointLimits>,
    /// Scene node carrying this joint's motion
    pub node: NodeId,
    value: f32,
}

impl JointState {
    pub fn new(
        name: impl Into<String>,
        joint_type: JointType,
        axis: Vec3,
        limits: Option<JointLimits>,
        node: NodeId,
    ) -> Self {
        Self {
            name: name.into(),
            joint_type,
            axis: axis.normalize_or_zero(),
            limits,
            node,
            value: 0.0,
        }
    }

    /// Current position (rad or m)
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Clamp a candidate position against this joint's limits
    pub fn clamp(&self, value: f32) -> f32 {
        match self.limits {
            Some(limits) => limits.clamp(value),
            None => value,
        }
    }

    pub(crate) fn set_value_clamped(&mut self, value: f32) {
        self.value = self.clamp(value);
    }
}

/// A renderable sub-object of the robot.
///
/// Belongs to exactly one scene node; the owning joint (if any) is resolved
/// by walking the node tree upward, not stored here.
#[derive(Debug, Clone)]
pub struct VisualPart {
    /// Renderer key
    pub id: Uuid,
    pub name: String,
    /// Owning scene node (kind Visual)
    pub node: NodeId,
    pub vertices: Vec<[f32; 3]>,
    /// One normal per triangle
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    /// Base material color; None when the URDF visual has no material
    pub color: Option<[f32; 4]>,
}

impl VisualPart {
    pub fn new(name: impl Into<String>, node: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            node,
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            bbox_min: [0.0; 3],
            bbox_max: [0.0; 3],
            color: None,
        }
    }

    /// Recalculate the local bounding box from vertices
    pub fn calculate_bounding_box(&mut self) {
        if self.vertices.is_empty() {
            self.bbox_min = [0.0; 3];
            self.bbox_max = [0.0; 3];
            return;
        }

        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        self.bbox_min = min;
        self.bbox_max = max;
    }

    /// Center of the local bounding box
    pub fn center(&self) -> Vec3 {
        (Vec3::from(self.bbox_min) + Vec3::from(self.bbox_max)) * 0.5
    }

    /// Size of the local bounding box
    pub fn size(&self) -> Vec3 {
        Vec3::from(self.bbox_max) - Vec3::from(self.bbox_min)
    }
}

/// The loaded articulated robot.
///
/// Created wholesale by the loader and replaced wholesale on reload; the only
/// post-load mutations are joint values and the one-time root transform.
#[derive(Debug, Clone)]
pub struct RobotModel {
    pub name: String,
    pub(crate) nodes: Vec<SceneNode>,
    /// Joints in URDF document order
    pub(crate) joints: Vec<JointState>,
    pub(crate) joint_index: HashMap<String, usize>,
    pub(crate) parts: Vec<VisualPart>,
    /// Applied once after load to orient the model upright
    pub(crate) root_transform: Mat4,
    /// World transform per node, kept in sync with joint values
    pub(crate) world: Vec<Mat4>,
}

impl RobotModel {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            joints: Vec::new(),
            joint_index: HashMap::new(),
            parts: Vec::new(),
            root_transform: Mat4::IDENTITY,
            world: Vec::new(),
        }
    }

    // ============== Joints ==============

    /// Joints in document order
    pub fn joints(&self) -> &[JointState] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&JointState> {
        self.joints.get(index)
    }

    /// Find a joint index by name (O(1) lookup)
    pub fn find_joint_by_name(&self, name: &str) -> Option<usize> {
        self.joint_index.get(name).copied()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Set a joint's position, clamped to its limits.
    ///
    /// This is the only joint mutation path; world transforms are refreshed
    /// before returning. Returns false if the index is out of range.
    pub fn set_joint_value(&mut self, index: usize, value: f32) -> bool {
        let Some(joint) = self.joints.get_mut(index) else {
            return false;
        };
        joint.set_value_clamped(value);
        self.update_world_transforms();
        true
    }

    /// Set a joint's position by name, clamped to its limits
    pub fn set_joint_value_by_name(&mut self, name: &str, value: f32) -> bool {
        match self.find_joint_by_name(name) {
            Some(index) => self.set_joint_value(index, value),
            None => false,
        }
    }

    // ============== Scene nodes ==============

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn push_node(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Walk upward from a node to the nearest enclosing articulated joint.
    ///
    /// Returns the joint index, or None if the root is reached first.
    /// Pure function of the hierarchy; O(depth).
    pub fn nearest_joint(&self, node: NodeId) -> Option<usize> {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            if let NodeKind::Joint(joint) = n.kind {
                return Some(joint);
            }
            current = n.parent;
        }
        None
    }

    // ============== Parts ==============

    pub fn parts(&self) -> &[VisualPart] {
        &self.parts
    }

    /// Find a part by its renderer key
    pub fn find_part(&self, id: Uuid) -> Option<&VisualPart> {
        self.parts.iter().find(|p| p.id == id)
    }

    // ============== Root transform ==============

    /// Set the one-time model orientation transform
    pub fn set_root_transform(&mut self, transform: Mat4) {
        self.root_transform = transform;
        self.update_world_transforms();
    }

    pub fn root_transform(&self) -> Mat4 {
        self.root_transform
    }

    /// Bounding sphere over all parts in world space, for camera fitting
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;

        for part in &self.parts {
            let transform = self.world[part.node.0];
            // Transform the eight bbox corners; cheap and good enough for fitting
            for i in 0..8 {
                let corner = Vec3::new(
                    if i & 1 == 0 { part.bbox_min[0] } else { part.bbox_max[0] },
                    if i & 2 == 0 { part.bbox_min[1] } else { part.bbox_max[1] },
                    if i & 4 == 0 { part.bbox_min[2] } else { part.bbox_max[2] },
                );
                let p = transform.transform_point3(corner);
                min = min.min(p);
                max = max.max(p);
                any = true;
            }
        }

        if !any {
            return (Vec3::ZERO, 1.0);
        }
        let center = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(0.1);
        (center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_type_dof() {
        assert!(JointType::Revolute.has_dof());
        assert!(JointType::Continuous.has_dof());
        assert!(JointType::Prismatic.has_dof());
        assert!(!JointType::Fixed.has_dof());
        assert!(!JointType::Floating.has_dof());
        assert!(!JointType::Planar.has_dof());
    }

    #[test]
    fn test_limits_clamp() {
        let limits = JointLimits::new(-1.0, 1.0);
        assert_eq!(limits.clamp(0.5), 0.5);
        assert_eq!(limits.clamp(2.5), 1.0);
        assert_eq!(limits.clamp(-3.0), -1.0);
    }

    #[test]
    fn test_continuous_joint_unbounded() {
        let joint = JointState::new(
            "wheel",
            JointType::Continuous,
            Vec3::Z,
            None,
            NodeId(0),
        );
        assert_eq!(joint.clamp(100.0), 100.0);
        assert_eq!(joint.clamp(-100.0), -100.0);
    }

    #[test]
    fn test_part_bounding_box() {
        let mut part = VisualPart::new("body", NodeId(0));
        part.vertices = vec![[-1.0, 0.0, 0.0], [1.0, 2.0, 0.0], [0.0, 1.0, 3.0]];
        part.calculate_bounding_box();
        assert_eq!(part.bbox_min, [-1.0, 0.0, 0.0]);
        assert_eq!(part.bbox_max, [1.0, 2.0, 3.0]);
        assert_eq!(part.center(), Vec3::new(0.0, 1.0, 1.5));
    }
}
