//! 3D viewport panel
//!
//! Owns the frame-by-frame wiring between egui pointer events, the
//! interaction controller, and the renderer. egui's drag capture keeps
//! delivering `dragged_by` events after the pointer leaves the image rect,
//! so a joint drag survives leaving the viewport.

use glam::{Mat4, Vec3};

use viewer_core::RobotModel;

use crate::interaction::InteractionController;
use crate::viewport_state::SharedViewportState;

const ORBIT_SENSITIVITY: f32 = 0.005;

/// 3D viewport panel
pub struct ViewportPanel {
    last_size: egui::Vec2,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            last_size: egui::Vec2::ZERO,
        }
    }

    /// Fallback when WGPU is unavailable
    pub fn ui_unavailable(&mut self, ui: &mut egui::Ui) {
        let available_size = ui.available_size();
        let (response, painter) =
            ui.allocate_painter(available_size, egui::Sense::click_and_drag());

        painter.rect_filled(response.rect, 0.0, egui::Color32::from_rgb(30, 30, 30));
        painter.text(
            response.rect.center(),
            egui::Align2::CENTER_CENTER,
            "3D Viewport\n(WebGPU not available)",
            egui::FontId::proportional(16.0),
            egui::Color32::GRAY,
        );

        self.last_size = available_size;
    }

    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        model: Option<&mut RobotModel>,
        interaction: &mut InteractionController,
        render_state: &egui_wgpu::RenderState,
        viewport_state: &SharedViewportState,
    ) {
        // Toolbar
        ui.horizontal(|ui| {
            ui.label("View:");
            if ui.button("Top").clicked() {
                viewport_state.lock().renderer.camera_mut().set_top_view();
            }
            if ui.button("Front").clicked() {
                viewport_state.lock().renderer.camera_mut().set_front_view();
            }
            if ui.button("Side").clicked() {
                viewport_state.lock().renderer.camera_mut().set_side_view();
            }
            if ui.button("Fit").clicked() {
                let (center, radius) = match &model {
                    Some(m) => m.bounding_sphere(),
                    None => (Vec3::ZERO, 2.0),
                };
                viewport_state
                    .lock()
                    .renderer
                    .camera_mut()
                    .fit_all(center, radius);
            }

            ui.separator();

            let mut state = viewport_state.lock();
            let mut show_grid = state.renderer.show_grid();
            if ui.checkbox(&mut show_grid, "Grid").changed() {
                state.renderer.set_show_grid(show_grid);
            }
        });

        // Main viewport area
        let available_size = ui.available_size();
        let width = available_size.x as u32;
        let height = available_size.y as u32;

        if width == 0 || height == 0 {
            return;
        }

        // Ensure texture and render
        let texture_id = {
            let mut state = viewport_state.lock();
            let mut egui_renderer = render_state.renderer.write();
            let tex_id = state.ensure_texture(width, height, &mut egui_renderer);
            state.render();
            tex_id
        };

        // Display the rendered texture
        let response = ui.add(
            egui::Image::new(egui::load::SizedTexture::new(
                texture_id,
                [available_size.x, available_size.y],
            ))
            .sense(egui::Sense::click_and_drag()),
        );

        // Pointer position relative to the viewport
        let mouse_pos = response.hover_pos().or(response.interact_pointer_pos());
        let local_mouse = mouse_pos.map(|p| p - response.rect.min);

        let mut vp_state = viewport_state.lock();

        if let Some(model) = model {
            // Hover pick and highlight
            if let Some(pos) = local_mouse
                && !interaction.is_dragging()
            {
                let hit = vp_state.pick(model, pos.x, pos.y, available_size.x, available_size.y);
                let writes = interaction.pointer_hover(model, hit);
                vp_state.apply_color_writes(&writes);
            }

            // Joint drag with the left button
            if let Some(pos) = local_mouse {
                if response.drag_started_by(egui::PointerButton::Primary) {
                    let hit =
                        vp_state.pick(model, pos.x, pos.y, available_size.x, available_size.y);
                    let writes = interaction.pointer_press(model, hit, pos.x);
                    vp_state.apply_color_writes(&writes);
                }

                if interaction.is_dragging() && response.dragged_by(egui::PointerButton::Primary) {
                    let forward = vp_state.renderer.camera().forward();
                    if interaction.pointer_move(model, pos.x, forward) {
                        vp_state.sync_transforms(model);
                    }
                }
            }

            if response.drag_stopped_by(egui::PointerButton::Primary) {
                let writes = interaction.pointer_release();
                vp_state.apply_color_writes(&writes);
            }
        }

        // Camera input, disabled while a joint drag owns the pointer
        if !interaction.is_dragging() {
            if response.drag_started_by(egui::PointerButton::Middle)
                || response.drag_started_by(egui::PointerButton::Secondary)
            {
                let writes = interaction.camera_started();
                vp_state.apply_color_writes(&writes);
            }
            if response.drag_stopped_by(egui::PointerButton::Middle)
                || response.drag_stopped_by(egui::PointerButton::Secondary)
            {
                interaction.camera_ended();
            }

            // Middle drag: orbit, or pan with shift
            if response.dragged_by(egui::PointerButton::Middle) {
                let delta = response.drag_delta();
                if ui.input(|i| i.modifiers.shift) {
                    vp_state.renderer.camera_mut().pan(delta.x, delta.y);
                } else {
                    vp_state
                        .renderer
                        .camera_mut()
                        .orbit(-delta.x * ORBIT_SENSITIVITY, delta.y * ORBIT_SENSITIVITY);
                }
            }

            // Right drag orbits as well
            if response.dragged_by(egui::PointerButton::Secondary) {
                let delta = response.drag_delta();
                vp_state
                    .renderer
                    .camera_mut()
                    .orbit(-delta.x * ORBIT_SENSITIVITY, delta.y * ORBIT_SENSITIVITY);
            }

            // Zoom with scroll
            if response.hovered() {
                let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
                if scroll_delta != 0.0 {
                    vp_state.renderer.camera_mut().zoom(scroll_delta * 0.01);
                }
            }
        }

        let view = vp_state.renderer.camera().view_matrix();
        drop(vp_state);

        self.render_axes_indicator(ui, response.rect, view);

        self.last_size = available_size;
    }

    /// Small orientation gizmo in the bottom-right corner.
    ///
    /// The view matrix already is the world-to-camera basis, so each world
    /// axis lands in screen space by a single rotation; the view-space z
    /// component doubles as the paint order and as the facing test.
    fn render_axes_indicator(&self, ui: &mut egui::Ui, rect: egui::Rect, view: Mat4) {
        const AXIS_LEN: f32 = 30.0;
        let painter = ui.painter();
        let center = rect.right_bottom() - egui::vec2(50.0, 50.0);

        let mut axes = [
            (Vec3::X, "X", egui::Color32::from_rgb(255, 68, 68)),
            (Vec3::Y, "Y", egui::Color32::from_rgb(68, 255, 68)),
            (Vec3::Z, "Z", egui::Color32::from_rgb(68, 68, 255)),
        ]
        .map(|(axis, label, color)| {
            let v = view.transform_vector3(axis);
            (v.z, egui::vec2(v.x, -v.y) * AXIS_LEN, label, color)
        });
        // Away-facing axes first so the near ones paint over them
        axes.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (toward_camera, dir, label, color) in axes {
            let color = if toward_camera < 0.0 {
                color.gamma_multiply(0.5)
            } else {
                color
            };
            let tip = center + dir;
            painter.line_segment([center, tip], egui::Stroke::new(2.0, color));
            painter.circle_filled(tip, 7.0, color);
            painter.text(
                tip,
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::proportional(10.0),
                egui::Color32::BLACK,
            );
        }
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}
