//! Scene node tree for the loaded robot
//!
//! The tree is an arena of nodes built once at load time: link frames are
//! Group nodes, joint motions are Joint nodes, renderable leaves are Visual
//! nodes. Parents always precede children in the arena, so world transforms
//! can be computed in a single forward pass.

use glam::Mat4;

/// Index of a node in the model's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// What a scene node represents.
///
/// Classification of "is this an articulated joint" is done on this tag,
/// never on names or downcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A link frame or other non-articulated structure
    Group,
    /// An articulated joint; payload is the index into `RobotModel::joints`
    Joint(usize),
    /// A renderable leaf; payload is the index into `RobotModel::parts`
    Visual(usize),
}

/// One node of the robot scene tree
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    /// None only for the root
    pub parent: Option<NodeId>,
    /// Static local transform (joint origin or visual origin)
    pub local: Mat4,
}

impl SceneNode {
    pub fn new(
        name: impl Into<String>,
        kind: NodeKind,
        parent: Option<NodeId>,
        local: Mat4,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent,
            local,
        }
    }

    pub fn is_joint(&self) -> bool {
        matches!(self.kind, NodeKind::Joint(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{JointState, JointType, RobotModel};
    use glam::Vec3;

    /// root group -> joint -> link group -> visual, plus a visual hanging
    /// directly off the root with no joint above it.
    fn build_model() -> RobotModel {
        let mut model = RobotModel::new("test");
        let root = model.push_node(SceneNode::new(
            "root",
            NodeKind::Group,
            None,
            Mat4::IDENTITY,
        ));
        let joint_node = model.push_node(SceneNode::new(
            "elbow",
            NodeKind::Joint(0),
            Some(root),
            Mat4::IDENTITY,
        ));
        let link = model.push_node(SceneNode::new(
            "forearm",
            NodeKind::Group,
            Some(joint_node),
            Mat4::IDENTITY,
        ));
        model.push_node(SceneNode::new(
            "forearm_visual",
            NodeKind::Visual(0),
            Some(link),
            Mat4::IDENTITY,
        ));
        model.push_node(SceneNode::new(
            "base_visual",
            NodeKind::Visual(1),
            Some(root),
            Mat4::IDENTITY,
        ));
        model.joints.push(JointState::new(
            "elbow",
            JointType::Revolute,
            Vec3::Z,
            None,
            joint_node,
        ));
        model.joint_index.insert("elbow".into(), 0);
        model.update_world_transforms();
        model
    }

    #[test]
    fn test_nearest_joint_found() {
        let model = build_model();
        // forearm_visual is NodeId(3): visual -> link -> joint
        assert_eq!(model.nearest_joint(NodeId(3)), Some(0));
    }

    #[test]
    fn test_nearest_joint_none_for_unarticulated() {
        let model = build_model();
        // base_visual hangs off the root with no joint in between
        assert_eq!(model.nearest_joint(NodeId(4)), None);
        assert_eq!(model.nearest_joint(NodeId(0)), None);
    }

    #[test]
    fn test_nearest_joint_stops_at_first() {
        let model = build_model();
        // Starting at the joint node itself returns that joint
        assert_eq!(model.nearest_joint(NodeId(1)), Some(0));
    }
}
