//! Forward kinematics: world transforms with joint values applied

use glam::{Mat4, Quat, Vec3};

use crate::robot::{JointType, RobotModel};
use crate::scene::NodeKind;

impl RobotModel {
    /// Recompute every node's world transform root-down.
    ///
    /// `world = parent_world * local * joint_motion(value)` for joint nodes,
    /// `world = parent_world * local` otherwise. The root additionally
    /// applies the model orientation transform.
    pub fn update_world_transforms(&mut self) {
        self.world.clear();
        self.world.reserve(self.nodes.len());

        // Parents precede children in the arena, so one forward pass suffices.
        for i in 0..self.nodes.len() {
            let node = &self.nodes[i];
            let parent_world = match node.parent {
                Some(parent) => self.world[parent.0],
                None => self.root_transform,
            };
            let mut world = parent_world * node.local;
            if let NodeKind::Joint(j) = node.kind {
                let joint = &self.joints[j];
                world *= joint_motion(joint.joint_type, joint.axis, joint.value());
            }
            self.world.push(world);
        }
    }

    /// World transform of a node (identity if transforms were never computed)
    pub fn node_world_transform(&self, node: crate::scene::NodeId) -> Mat4 {
        self.world.get(node.0).copied().unwrap_or(Mat4::IDENTITY)
    }

    /// World transform of a part's scene node
    pub fn part_world_transform(&self, part_index: usize) -> Mat4 {
        self.parts
            .get(part_index)
            .map(|p| self.node_world_transform(p.node))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// The joint's axis rotated into world space by the joint node's
    /// orientation. Used by the drag controller's direction-sign rule.
    pub fn joint_world_axis(&self, joint_index: usize) -> Vec3 {
        let Some(joint) = self.joints.get(joint_index) else {
            return Vec3::Z;
        };
        let world = self.node_world_transform(joint.node);
        let (_, rotation, _) = world.to_scale_rotation_translation();
        (rotation * joint.axis).normalize_or_zero()
    }
}

/// Transform contributed by a joint at a given position
pub fn joint_motion(joint_type: JointType, axis: Vec3, position: f32) -> Mat4 {
    match joint_type {
        JointType::Revolute | JointType::Continuous => {
            Mat4::from_quat(Quat::from_axis_angle(axis, position))
        }
        JointType::Prismatic => Mat4::from_translation(axis * position),
        // Floating/planar would need more degrees of freedom than the viewer drives
        JointType::Fixed | JointType::Floating | JointType::Planar => Mat4::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{JointLimits, JointState};
    use crate::scene::{NodeId, SceneNode};
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_revolute_motion_rotates_about_axis() {
        let m = joint_motion(JointType::Revolute, Vec3::Z, FRAC_PI_2);
        approx(m.transform_point3(Vec3::X), Vec3::Y);
    }

    #[test]
    fn test_prismatic_motion_translates_along_axis() {
        let m = joint_motion(JointType::Prismatic, Vec3::X, 0.5);
        approx(m.transform_point3(Vec3::ZERO), Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_fixed_motion_is_identity() {
        assert_eq!(joint_motion(JointType::Fixed, Vec3::Z, 1.0), Mat4::IDENTITY);
    }

    /// root -> joint(Z axis) -> link -> visual offset 1m along X.
    fn arm_model() -> RobotModel {
        let mut model = RobotModel::new("arm");
        let root = model.push_node(SceneNode::new(
            "base",
            NodeKind::Group,
            None,
            Mat4::IDENTITY,
        ));
        let joint_node = model.push_node(SceneNode::new(
            "shoulder",
            NodeKind::Joint(0),
            Some(root),
            Mat4::IDENTITY,
        ));
        let link = model.push_node(SceneNode::new(
            "arm",
            NodeKind::Group,
            Some(joint_node),
            Mat4::IDENTITY,
        ));
        model.push_node(SceneNode::new(
            "arm_visual",
            NodeKind::Visual(0),
            Some(link),
            Mat4::from_translation(Vec3::X),
        ));
        model.joints.push(JointState::new(
            "shoulder",
            JointType::Revolute,
            Vec3::Z,
            Some(JointLimits::new(-3.0, 3.0)),
            joint_node,
        ));
        model.joint_index.insert("shoulder".into(), 0);
        model.update_world_transforms();
        model
    }

    #[test]
    fn test_joint_value_moves_descendants() {
        let mut model = arm_model();
        let before = model.node_world_transform(NodeId(3)).transform_point3(Vec3::ZERO);
        approx(before, Vec3::X);

        assert!(model.set_joint_value(0, FRAC_PI_2));
        let after = model.node_world_transform(NodeId(3)).transform_point3(Vec3::ZERO);
        approx(after, Vec3::Y);
    }

    #[test]
    fn test_set_joint_value_clamps() {
        let mut model = arm_model();
        assert!(model.set_joint_value(0, 10.0));
        assert_eq!(model.joint(0).unwrap().value(), 3.0);
        assert!(model.set_joint_value(0, -10.0));
        assert_eq!(model.joint(0).unwrap().value(), -3.0);
    }

    #[test]
    fn test_joint_world_axis_follows_root_transform() {
        let mut model = arm_model();
        approx(model.joint_world_axis(0), Vec3::Z);

        // Reorient the whole model: Z axis now points along world Y
        model.set_root_transform(Mat4::from_rotation_x(-FRAC_PI_2));
        approx(model.joint_world_axis(0), Vec3::Y);
    }
}
