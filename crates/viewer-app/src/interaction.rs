//! Viewport pointer interaction: joint dragging and hover highlighting
//!
//! The controller is a small state machine (idle, hovering, dragging) that
//! owns the drag arithmetic and the highlight color bookkeeping, and stays
//! free of GPU state. Color changes come back as [`ColorWrite`] values the
//! viewport applies to the renderer, which keeps every transition testable.

use glam::Vec3;
use uuid::Uuid;

use viewer_core::RobotModel;

/// Joint position change per horizontal pixel (rad or m)
pub const DRAG_SENSITIVITY: f32 = 0.01;

/// Display color for the hovered or dragged part
pub const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 0.85, 0.2, 1.0];

/// A pending renderer color update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorWrite {
    pub part: Uuid,
    pub color: [f32; 4],
}

/// Interaction phase
enum Phase {
    Idle,
    Hovering {
        part: Uuid,
        /// Base color to restore; None when the part has no material color
        /// (its highlight was a no-op)
        restore: Option<[f32; 4]>,
    },
    Dragging {
        joint: usize,
        part: Uuid,
        restore: Option<[f32; 4]>,
        /// Pointer x of the previous frame; deltas are frame-to-frame
        last_x: f32,
    },
}

/// Drag-vs-orbit arbitration and joint drag state
pub struct InteractionController {
    phase: Phase,
    /// True while a camera gesture (orbit/pan) owns the pointer
    camera_busy: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            camera_busy: false,
        }
    }

    /// True while a joint drag is in progress; camera input is disabled
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Part currently highlighted (hovered or dragged)
    pub fn active_part(&self) -> Option<Uuid> {
        match self.phase {
            Phase::Idle => None,
            Phase::Hovering { part, .. } | Phase::Dragging { part, .. } => Some(part),
        }
    }

    /// Joint currently being dragged
    pub fn dragged_joint(&self) -> Option<usize> {
        match self.phase {
            Phase::Dragging { joint, .. } => Some(joint),
            _ => None,
        }
    }

    /// Resolve a picked part to a draggable joint.
    ///
    /// The part must have an articulated joint ancestor; parts above every
    /// joint and parts under fixed joints are not draggable.
    fn draggable_joint(model: &RobotModel, part_id: Uuid) -> Option<(usize, Option<[f32; 4]>)> {
        let part = model.find_part(part_id)?;
        let joint_index = model.nearest_joint(part.node)?;
        let joint = model.joint(joint_index)?;
        if !joint.joint_type.has_dof() {
            return None;
        }
        Some((joint_index, part.color))
    }

    /// Update hover state from the current pick result.
    ///
    /// Hover feedback only applies to draggable parts with a material color;
    /// everything else behaves as empty space. Ignored while dragging or
    /// while the camera owns the pointer.
    pub fn pointer_hover(&mut self, model: &RobotModel, hit: Option<Uuid>) -> Vec<ColorWrite> {
        if self.is_dragging() {
            return Vec::new();
        }

        let target = if self.camera_busy {
            None
        } else {
            hit.and_then(|id| {
                Self::draggable_joint(model, id).map(|(_, restore)| (id, restore))
            })
        };

        let mut writes = Vec::new();
        match (&self.phase, target) {
            (Phase::Hovering { part, .. }, Some((new_part, _))) if *part == new_part => {}
            (Phase::Hovering { part, restore }, new) => {
                if let Some(color) = restore {
                    writes.push(ColorWrite {
                        part: *part,
                        color: *color,
                    });
                }
                self.phase = match new {
                    Some((part, restore)) => {
                        if restore.is_some() {
                            writes.push(ColorWrite {
                                part,
                                color: HIGHLIGHT_COLOR,
                            });
                        }
                        Phase::Hovering { part, restore }
                    }
                    None => Phase::Idle,
                };
            }
            (Phase::Idle, Some((part, restore))) => {
                if restore.is_some() {
                    writes.push(ColorWrite {
                        part,
                        color: HIGHLIGHT_COLOR,
                    });
                }
                self.phase = Phase::Hovering { part, restore };
            }
            (Phase::Idle, None) => {}
            (Phase::Dragging { .. }, _) => {}
        }
        writes
    }

    /// Begin a drag on the picked part, if it is draggable.
    ///
    /// Returns the highlight writes to apply. A press on empty space, a
    /// non-articulated part, or a fixed-joint part leaves the controller
    /// unchanged (aside from clearing any hover).
    pub fn pointer_press(
        &mut self,
        model: &RobotModel,
        hit: Option<Uuid>,
        x: f32,
    ) -> Vec<ColorWrite> {
        if self.is_dragging() || self.camera_busy {
            return Vec::new();
        }

        let mut writes = Vec::new();

        let target = hit.and_then(|id| Self::draggable_joint(model, id).map(|j| (id, j)));
        let Some((part, (joint, restore))) = target else {
            // Not draggable: drop any hover highlight
            if let Phase::Hovering { part, restore } = &self.phase {
                if let Some(color) = restore {
                    writes.push(ColorWrite {
                        part: *part,
                        color: *color,
                    });
                }
                self.phase = Phase::Idle;
            }
            return writes;
        };

        // Carry the hover highlight over, or apply it now
        let already_highlighted =
            matches!(&self.phase, Phase::Hovering { part: p, .. } if *p == part);
        if !already_highlighted {
            if let Phase::Hovering {
                part: prev,
                restore: Some(color),
            } = &self.phase
            {
                writes.push(ColorWrite {
                    part: *prev,
                    color: *color,
                });
            }
            if restore.is_some() {
                writes.push(ColorWrite {
                    part,
                    color: HIGHLIGHT_COLOR,
                });
            }
        }

        tracing::debug!(
            "Drag started on joint '{}'",
            model.joint(joint).map(|j| j.name.as_str()).unwrap_or("?")
        );
        self.phase = Phase::Dragging {
            joint,
            part,
            restore,
            last_x: x,
        };
        writes
    }

    /// Advance an in-progress drag to the given pointer x.
    ///
    /// The horizontal delta since the previous frame is scaled by
    /// [`DRAG_SENSITIVITY`] and signed so the joint follows the pointer:
    /// when the world-space joint axis points toward the camera the screen
    /// sense inverts. Returns true when the joint value changed.
    pub fn pointer_move(&mut self, model: &mut RobotModel, x: f32, camera_forward: Vec3) -> bool {
        let Phase::Dragging { joint, last_x, .. } = &mut self.phase else {
            return false;
        };

        let delta_x = x - *last_x;
        *last_x = x;
        if delta_x == 0.0 {
            return false;
        }

        let joint_index = *joint;
        let world_axis = model.joint_world_axis(joint_index);
        let dot = world_axis.dot(camera_forward);
        let direction = if dot == 0.0 { 1.0 } else { -dot.signum() };

        let Some(current) = model.joint(joint_index).map(|j| j.value()) else {
            return false;
        };
        model.set_joint_value(joint_index, current + delta_x * DRAG_SENSITIVITY * direction)
    }

    /// End the drag and restore the dragged part's base color.
    ///
    /// The restore here is authoritative: it runs even if hover state was
    /// lost mid-drag.
    pub fn pointer_release(&mut self) -> Vec<ColorWrite> {
        let Phase::Dragging { part, restore, .. } = &self.phase else {
            return Vec::new();
        };

        let writes = match restore {
            Some(color) => vec![ColorWrite {
                part: *part,
                color: *color,
            }],
            None => Vec::new(),
        };
        self.phase = Phase::Idle;
        writes
    }

    /// A camera gesture (orbit/pan) took the pointer; suppress hover until
    /// it ends.
    pub fn camera_started(&mut self) -> Vec<ColorWrite> {
        self.camera_busy = true;
        if let Phase::Hovering { part, restore } = &self.phase {
            let writes = match restore {
                Some(color) => vec![ColorWrite {
                    part: *part,
                    color: *color,
                }],
                None => Vec::new(),
            };
            self.phase = Phase::Idle;
            return writes;
        }
        Vec::new()
    }

    /// The camera gesture ended; hover resumes on the next frame
    pub fn camera_ended(&mut self) {
        self.camera_busy = false;
    }

    pub fn is_camera_busy(&self) -> bool {
        self.camera_busy
    }

    /// Drop all interaction state without emitting restores.
    ///
    /// Used when the model is replaced: the renderer's parts are cleared
    /// wholesale, so stale color writes would target meshes that no longer
    /// exist.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.camera_busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_core::load::{LoadOptions, build_from_string};

    // One revolute joint (limits +-1.0, axis Z), one fixed joint, and a
    // base link above both.
    const TEST_URDF: &str = r#"
        <robot name="rig">
          <link name="base">
            <visual>
              <geometry><box size="0.2 0.2 0.2"/></geometry>
              <material name="gray"><color rgba="0.5 0.5 0.5 1"/></material>
            </visual>
          </link>
          <link name="arm">
            <visual>
              <geometry><cylinder radius="0.05" length="0.4"/></geometry>
              <material name="blue"><color rgba="0.2 0.2 0.9 1"/></material>
            </visual>
          </link>
          <link name="cap">
            <visual>
              <geometry><sphere radius="0.05"/></geometry>
              <material name="red"><color rgba="0.9 0.2 0.2 1"/></material>
            </visual>
          </link>
          <link name="plain">
            <visual>
              <geometry><sphere radius="0.03"/></geometry>
            </visual>
          </link>
          <link name="forearm">
            <visual>
              <geometry><cylinder radius="0.04" length="0.3"/></geometry>
              <material name="green"><color rgba="0.2 0.9 0.2 1"/></material>
            </visual>
          </link>
          <joint name="elbow" type="revolute">
            <parent link="base"/>
            <child link="arm"/>
            <axis xyz="0 0 1"/>
            <limit lower="-1.0" upper="1.0" effort="1" velocity="1"/>
          </joint>
          <joint name="cap_mount" type="fixed">
            <parent link="arm"/>
            <child link="cap"/>
          </joint>
          <joint name="plain_mount" type="continuous">
            <parent link="base"/>
            <child link="plain"/>
            <axis xyz="0 0 1"/>
          </joint>
          <joint name="wrist" type="revolute">
            <parent link="arm"/>
            <child link="forearm"/>
            <axis xyz="0 1 0"/>
            <limit lower="-2.0" upper="2.0" effort="1" velocity="1"/>
          </joint>
        </robot>
    "#;

    fn model() -> RobotModel {
        build_from_string(TEST_URDF, ".", &LoadOptions::default()).unwrap()
    }

    fn part_id(model: &RobotModel, name: &str) -> Uuid {
        model.parts().iter().find(|p| p.name == name).unwrap().id
    }

    // Camera looking along -Z: axis dot forward = -1, drag direction +1
    const FORWARD_NEG_Z: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    #[test]
    fn test_drag_accumulates_and_clamps() {
        let mut model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        ctl.pointer_press(&model, Some(arm), 0.0);
        assert!(ctl.is_dragging());

        // 250 px of rightward motion in uneven frames: raw delta is
        // 250 * 0.01 = 2.5, clamped to the 1.0 upper limit.
        let mut x = 0.0;
        for step in [50.0, 120.0, 30.0, 50.0] {
            x += step;
            ctl.pointer_move(&mut model, x, FORWARD_NEG_Z);
        }
        assert_eq!(model.joints()[0].value(), 1.0);

        // Dragging back recovers immediately from the clamped value
        ctl.pointer_move(&mut model, x - 10.0, FORWARD_NEG_Z);
        assert!((model.joints()[0].value() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_direction_follows_axis_facing() {
        let mut model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        // Axis +Z pointing at the camera (forward +Z): rightward drag
        // decreases the value
        ctl.pointer_press(&model, Some(arm), 0.0);
        ctl.pointer_move(&mut model, 10.0, Vec3::Z);
        assert!(model.joints()[0].value() < 0.0);
        ctl.pointer_release();

        model.set_joint_value(0, 0.0);

        // Axis pointing away: rightward drag increases
        ctl.pointer_press(&model, Some(arm), 0.0);
        ctl.pointer_move(&mut model, 10.0, FORWARD_NEG_Z);
        assert!(model.joints()[0].value() > 0.0);
    }

    #[test]
    fn test_zero_dot_breaks_toward_positive() {
        let mut model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        // Camera forward exactly perpendicular to the Z axis
        ctl.pointer_press(&model, Some(arm), 0.0);
        ctl.pointer_move(&mut model, 10.0, Vec3::X);
        assert!(model.joints()[0].value() > 0.0);
    }

    #[test]
    fn test_hover_round_trips_color() {
        let model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        let writes = ctl.pointer_hover(&model, Some(arm));
        assert_eq!(
            writes,
            vec![ColorWrite {
                part: arm,
                color: HIGHLIGHT_COLOR
            }]
        );

        // Re-hovering the same part is idle
        assert!(ctl.pointer_hover(&model, Some(arm)).is_empty());

        let writes = ctl.pointer_hover(&model, None);
        assert_eq!(
            writes,
            vec![ColorWrite {
                part: arm,
                color: [0.2, 0.2, 0.9, 1.0]
            }]
        );
    }

    #[test]
    fn test_sequential_hovers_restore_own_colors() {
        let model = model();
        let arm = part_id(&model, "arm");
        let forearm = part_id(&model, "forearm");
        let mut ctl = InteractionController::new();

        ctl.pointer_hover(&model, Some(arm));

        // Hand-off: the first part gets its own blue back before the second
        // is highlighted
        let writes = ctl.pointer_hover(&model, Some(forearm));
        assert_eq!(
            writes,
            vec![
                ColorWrite {
                    part: arm,
                    color: [0.2, 0.2, 0.9, 1.0]
                },
                ColorWrite {
                    part: forearm,
                    color: HIGHLIGHT_COLOR
                },
            ]
        );

        let writes = ctl.pointer_hover(&model, None);
        assert_eq!(
            writes,
            vec![ColorWrite {
                part: forearm,
                color: [0.2, 0.9, 0.2, 1.0]
            }]
        );
    }

    #[test]
    fn test_fixed_joint_part_inert() {
        let model = model();
        let cap = part_id(&model, "cap");
        let mut ctl = InteractionController::new();

        assert!(ctl.pointer_hover(&model, Some(cap)).is_empty());
        assert!(ctl.pointer_press(&model, Some(cap), 0.0).is_empty());
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_non_articulated_part_inert() {
        let model = model();
        let base = part_id(&model, "base");
        let mut ctl = InteractionController::new();

        assert!(ctl.pointer_hover(&model, Some(base)).is_empty());
        assert!(ctl.pointer_press(&model, Some(base), 0.0).is_empty());
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_colorless_part_drags_without_highlight() {
        let mut model = model();
        let plain = part_id(&model, "plain");
        let mut ctl = InteractionController::new();

        assert!(ctl.pointer_hover(&model, Some(plain)).is_empty());
        let writes = ctl.pointer_press(&model, Some(plain), 0.0);
        assert!(writes.is_empty());
        assert!(ctl.is_dragging());

        ctl.pointer_move(&mut model, 20.0, FORWARD_NEG_Z);
        let plain_joint = model.find_joint_by_name("plain_mount").unwrap();
        assert!(model.joints()[plain_joint].value() != 0.0);

        assert!(ctl.pointer_release().is_empty());
    }

    #[test]
    fn test_release_restores_even_after_hover_lost() {
        let model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        ctl.pointer_hover(&model, Some(arm));
        ctl.pointer_press(&model, Some(arm), 0.0);

        // Hover updates during the drag are ignored
        assert!(ctl.pointer_hover(&model, None).is_empty());

        let writes = ctl.pointer_release();
        assert_eq!(
            writes,
            vec![ColorWrite {
                part: arm,
                color: [0.2, 0.2, 0.9, 1.0]
            }]
        );
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_camera_gesture_suppresses_hover() {
        let model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        ctl.pointer_hover(&model, Some(arm));
        let writes = ctl.camera_started();
        // Orbit start drops the highlight
        assert_eq!(writes[0].color, [0.2, 0.2, 0.9, 1.0]);

        // No hover while orbiting
        assert!(ctl.pointer_hover(&model, Some(arm)).is_empty());
        assert!(ctl.pointer_press(&model, Some(arm), 0.0).is_empty());

        ctl.camera_ended();
        let writes = ctl.pointer_hover(&model, Some(arm));
        assert_eq!(writes[0].color, HIGHLIGHT_COLOR);
    }

    #[test]
    fn test_drag_blocks_camera_and_reenables() {
        let model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        ctl.pointer_press(&model, Some(arm), 0.0);
        // The viewport gates orbit/pan/zoom on this flag
        assert!(ctl.is_dragging());

        ctl.pointer_release();
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_reset_discards_mid_drag_state() {
        let mut model = model();
        let arm = part_id(&model, "arm");
        let mut ctl = InteractionController::new();

        ctl.pointer_press(&model, Some(arm), 0.0);
        ctl.pointer_move(&mut model, 10.0, FORWARD_NEG_Z);

        // Model swap: no restores are emitted and the drag is gone
        ctl.reset();
        assert!(!ctl.is_dragging());
        assert!(ctl.pointer_release().is_empty());

        // A fresh model is unaffected by stale pointer motion
        let mut fresh = build_from_string(TEST_URDF, ".", &LoadOptions::default()).unwrap();
        assert!(!ctl.pointer_move(&mut fresh, 50.0, FORWARD_NEG_Z));
        assert_eq!(fresh.joints()[0].value(), 0.0);
    }
}
