//! Main application

use std::sync::Arc;

use parking_lot::Mutex;

use viewer_core::{LoadOptions, RobotModel};

use crate::interaction::InteractionController;
use crate::loader::ModelLoader;
use crate::panels::{JointsPanel, ViewportPanel};
use crate::viewport_state::{SharedViewportState, ViewportState};

/// Main application
pub struct ViewerApp {
    model: Option<RobotModel>,
    model_source: Option<String>,
    url_input: String,
    loader: ModelLoader,
    interaction: InteractionController,
    viewport_state: Option<SharedViewportState>,
    viewport_panel: ViewportPanel,
    joints_panel: JointsPanel,
    status: String,
}

impl ViewerApp {
    /// Create the app, optionally starting a load of an initial model
    pub fn new(cc: &eframe::CreationContext<'_>, initial_source: Option<String>) -> Self {
        // Viewport state needs WGPU
        let viewport_state = cc.wgpu_render_state.as_ref().map(|render_state| {
            let device = render_state.device.clone();
            let queue = render_state.queue.clone();
            let format = render_state.target_format;

            Arc::new(Mutex::new(ViewportState::new(device, queue, format)))
        });

        let mut loader = ModelLoader::new();
        let status = match &initial_source {
            Some(source) => {
                loader.request(source.clone(), LoadOptions::default());
                format!("Loading {source}...")
            }
            None => "Open a URDF file to begin".to_string(),
        };

        Self {
            model: None,
            model_source: None,
            url_input: String::new(),
            loader,
            interaction: InteractionController::new(),
            viewport_state,
            viewport_panel: ViewportPanel::new(),
            joints_panel: JointsPanel::new(),
            status,
        }
    }

    fn request_load(&mut self, source: String) {
        self.status = format!("Loading {source}...");
        self.loader.request(source, LoadOptions::default());
    }

    /// Install a finished load, replacing the previous model wholesale
    fn process_load_results(&mut self) {
        let Some(result) = self.loader.poll() else {
            return;
        };

        match result.result {
            Ok(model) => {
                tracing::info!(
                    "Model '{}' ready: {} joints, {} parts",
                    model.name,
                    model.joint_count(),
                    model.parts().len()
                );
                self.status = format!(
                    "{}: {} joints, {} parts",
                    model.name,
                    model.joint_count(),
                    model.parts().len()
                );

                // Any in-flight hover or drag refers to the old model
                self.interaction.reset();

                if let Some(ref viewport_state) = self.viewport_state {
                    let mut vp = viewport_state.lock();
                    vp.install_model(&model);
                    let (center, radius) = model.bounding_sphere();
                    vp.renderer.camera_mut().fit_all(center, radius);
                }

                self.model = Some(model);
                self.model_source = Some(result.source);
            }
            Err(e) => {
                tracing::error!("Failed to load '{}': {}", result.source, e);
                self.status = format!("Failed to load {}: {e}", result.source);
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open URDF...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("URDF files", &["urdf", "xml"])
                            .pick_file()
                        {
                            self.request_load(path.to_string_lossy().to_string());
                        }
                        ui.close_menu();
                    }
                    ui.menu_button("Open URL", |ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.url_input)
                                .hint_text("https://...")
                                .desired_width(280.0),
                        );
                        if ui.button("Load").clicked() && !self.url_input.is_empty() {
                            let url = self.url_input.clone();
                            self.request_load(url);
                            ui.close_menu();
                        }
                    });
                    if ui
                        .add_enabled(self.model_source.is_some(), egui::Button::new("Reload"))
                        .clicked()
                    {
                        if let Some(source) = self.model_source.clone() {
                            self.request_load(source);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.process_load_results();
        if self.loader.is_loading() {
            // Keep polling for the background load
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        self.menu_bar(ctx);

        // Status line
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.loader.is_loading() {
                    ui.spinner();
                }
                ui.label(&self.status);

                let joint_readout = self.model.as_ref().and_then(|model| {
                    let index = self.interaction.dragged_joint().or_else(|| {
                        self.interaction
                            .active_part()
                            .and_then(|id| model.find_part(id))
                            .and_then(|part| model.nearest_joint(part.node))
                    });
                    index
                        .and_then(|i| model.joint(i))
                        .map(|j| format!("{} = {:.3}", j.name, j.value()))
                });
                if let Some(text) = joint_readout {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.monospace(text);
                    });
                }
            });
        });

        // Joint list
        egui::SidePanel::left("joints_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Joints");
                ui.separator();
                match self.model.as_mut() {
                    Some(model) => {
                        self.joints_panel.ui(ui, model, &self.viewport_state);
                    }
                    None => {
                        ui.weak("No model loaded");
                    }
                }
            });

        // 3D viewport
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                match (frame.wgpu_render_state(), &self.viewport_state) {
                    (Some(render_state), Some(viewport_state)) => {
                        self.viewport_panel.ui(
                            ui,
                            self.model.as_mut(),
                            &mut self.interaction,
                            render_state,
                            viewport_state,
                        );
                    }
                    _ => self.viewport_panel.ui_unavailable(ui),
                }
            });
    }
}
