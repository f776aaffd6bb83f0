//! Viewport rendering state

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use viewer_core::RobotModel;
use viewer_renderer::{PickHit, Renderer, pick_part};

use crate::interaction::ColorWrite;

/// Render texture for the viewport
struct RenderTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    egui_texture_id: egui::TextureId,
    width: u32,
    height: u32,
}

/// Viewport rendering state
pub struct ViewportState {
    pub renderer: Renderer,
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    render_texture: Option<RenderTexture>,
}

impl ViewportState {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let renderer = Renderer::new(&device, format, 800, 600);
        Self {
            renderer,
            device,
            queue,
            render_texture: None,
        }
    }

    /// Ensure the render texture matches the requested size
    pub fn ensure_texture(
        &mut self,
        width: u32,
        height: u32,
        egui_renderer: &mut egui_wgpu::Renderer,
    ) -> egui::TextureId {
        let width = width.max(1);
        let height = height.max(1);

        let needs_recreate = self
            .render_texture
            .as_ref()
            .is_none_or(|t| t.width != width || t.height != height);

        if needs_recreate {
            if let Some(old) = self.render_texture.take() {
                egui_renderer.free_texture(&old.egui_texture_id);
            }

            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Viewport Render Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: self.renderer.format(),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

            let egui_texture_id = egui_renderer.register_native_texture(
                &self.device,
                &view,
                wgpu::FilterMode::Linear,
            );

            self.renderer.resize(&self.device, width, height);

            self.render_texture = Some(RenderTexture {
                texture,
                view,
                egui_texture_id,
                width,
                height,
            });
        }

        self.render_texture
            .as_ref()
            .map(|t| t.egui_texture_id)
            .unwrap_or(egui::TextureId::default())
    }

    /// Render the 3D scene to the texture
    pub fn render(&mut self) {
        let Some(ref rt) = self.render_texture else {
            return;
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewport Render Encoder"),
            });

        self.renderer.render(&mut encoder, &rt.view, &self.queue);

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload all of a model's parts, replacing any previous model
    pub fn install_model(&mut self, model: &RobotModel) {
        self.renderer.clear_parts();
        for part in model.parts() {
            self.renderer.add_part(&self.device, part);
        }
        let (_, radius) = model.bounding_sphere();
        self.renderer.fit_grid_to_radius(&self.device, radius);
        self.sync_transforms(model);
    }

    /// Push the model's current world transforms to the GPU
    pub fn sync_transforms(&mut self, model: &RobotModel) {
        for part in model.parts() {
            self.renderer.update_part_transform(
                &self.queue,
                part.id,
                model.node_world_transform(part.node),
            );
        }
    }

    /// Apply highlight/restore color updates
    pub fn apply_color_writes(&mut self, writes: &[ColorWrite]) {
        for write in writes {
            self.renderer
                .update_part_color(&self.queue, write.part, write.color);
        }
    }

    /// Remove all parts
    pub fn clear_parts(&mut self) {
        self.renderer.clear_parts();
    }

    /// Pick the part under a viewport-local position
    pub fn pick(
        &self,
        model: &RobotModel,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Option<Uuid> {
        let (ray_origin, ray_dir) = self.renderer.camera().screen_to_ray(x, y, width, height);
        let candidates = model
            .parts()
            .iter()
            .map(|part| (part.id, model.node_world_transform(part.node), part));
        pick_part(ray_origin, ray_dir, candidates).map(|hit: PickHit| hit.part)
    }
}

pub type SharedViewportState = Arc<Mutex<ViewportState>>;
