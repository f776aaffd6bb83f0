//! Joint list panel with position sliders

use viewer_core::RobotModel;

use crate::viewport_state::SharedViewportState;

/// Joint list panel
#[derive(Default)]
pub struct JointsPanel;

impl JointsPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        model: &mut RobotModel,
        viewport_state: &Option<SharedViewportState>,
    ) {
        ui.horizontal(|ui| {
            ui.strong(model.name.clone());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Reset").on_hover_text("Zero all joints").clicked() {
                    for i in 0..model.joint_count() {
                        model.set_joint_value(i, 0.0);
                    }
                    Self::sync(model, viewport_state);
                }
            });
        });
        ui.separator();

        let mut changed = false;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for index in 0..model.joint_count() {
                let Some(joint) = model.joint(index) else {
                    continue;
                };
                let name = joint.name.clone();
                let type_name = joint.joint_type.display_name();
                let has_dof = joint.joint_type.has_dof();
                let limits = joint.limits;
                let mut value = joint.value();

                ui.horizontal(|ui| {
                    ui.label(&name);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.weak(type_name);
                    });
                });

                if has_dof {
                    let edited = match limits {
                        Some(limits) => ui
                            .add(
                                egui::Slider::new(&mut value, limits.lower..=limits.upper)
                                    .fixed_decimals(3),
                            )
                            .changed(),
                        // Continuous joints have no limits; use a drag value
                        None => ui
                            .add(egui::DragValue::new(&mut value).speed(0.01))
                            .changed(),
                    };
                    if edited {
                        model.set_joint_value(index, value);
                        changed = true;
                    }
                }

                ui.add_space(4.0);
            }
        });

        if changed {
            Self::sync(model, viewport_state);
        }
    }

    fn sync(model: &RobotModel, viewport_state: &Option<SharedViewportState>) {
        if let Some(vp) = viewport_state {
            vp.lock().sync_transforms(model);
        }
    }
}
