//! Main renderer combining the sub-renderers

use std::collections::HashMap;

use glam::Mat4;
use uuid::Uuid;
use wgpu::util::DeviceExt;

use viewer_core::VisualPart;

use crate::camera::Camera;
use crate::constants::viewport::{CLEAR_COLOR, SAMPLE_COUNT};
use crate::grid::GridRenderer;
use crate::mesh::{MeshData, MeshRenderer};

/// Mesh entry with bind group
pub struct MeshEntry {
    pub data: MeshData,
    pub bind_group: wgpu::BindGroup,
}

/// Main renderer
pub struct Renderer {
    camera: Camera,
    camera_buffer: wgpu::Buffer,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    // MSAA color texture
    msaa_texture: Option<wgpu::Texture>,
    msaa_view: Option<wgpu::TextureView>,

    grid_renderer: GridRenderer,
    mesh_renderer: MeshRenderer,

    // UUID-keyed storage for O(1) lookup and removal
    meshes: HashMap<Uuid, MeshEntry>,

    show_grid: bool,

    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let depth_format = wgpu::TextureFormat::Depth32Float;

        let camera = Camera::new(width as f32 / height as f32);
        let camera_uniform = camera.uniform();

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let (depth_texture, depth_view) = Self::create_depth_texture(device, width, height);
        let (msaa_texture, msaa_view) =
            match Self::create_msaa_texture(device, format, width, height) {
                Some((tex, view)) => (Some(tex), Some(view)),
                None => (None, None),
            };

        let grid_renderer = GridRenderer::new(
            device,
            format,
            depth_format,
            &camera_bind_group_layout,
            &camera_buffer,
        );

        let mesh_renderer = MeshRenderer::new(
            device,
            format,
            depth_format,
            &camera_bind_group_layout,
            &camera_buffer,
        );

        Self {
            camera,
            camera_buffer,
            depth_texture,
            depth_view,
            msaa_texture,
            msaa_view,
            grid_renderer,
            mesh_renderer,
            meshes: HashMap::new(),
            show_grid: true,
            format,
            width,
            height,
        }
    }

    // ========== Camera accessors ==========

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    // ========== Display options ==========

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    /// Grow the ground grid to cover a model of the given bounding radius
    pub fn fit_grid_to_radius(&mut self, device: &wgpu::Device, radius: f32) {
        self.grid_renderer.fit_to_radius(device, radius);
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn create_msaa_texture(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Option<(wgpu::Texture, wgpu::TextureView)> {
        if SAMPLE_COUNT <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("MSAA Color Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Some((texture, view))
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        self.camera.update_aspect(width as f32 / height as f32);
        let (depth_texture, depth_view) = Self::create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;

        let (msaa_texture, msaa_view) =
            match Self::create_msaa_texture(device, self.format, width, height) {
                Some((tex, view)) => (Some(tex), Some(view)),
                None => (None, None),
            };
        self.msaa_texture = msaa_texture;
        self.msaa_view = msaa_view;
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn update_camera(&self, queue: &wgpu::Queue) {
        let camera_uniform = self.camera.uniform();
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );
    }

    /// Upload a part's mesh and register it under the part's id
    pub fn add_part(&mut self, device: &wgpu::Device, part: &VisualPart) -> Uuid {
        let data = MeshData::from_part(device, part);
        let bind_group = self.mesh_renderer.create_instance_bind_group(device, &data);

        self.meshes.insert(part.id, MeshEntry { data, bind_group });
        tracing::debug!("Added part '{}', {} total", part.name, self.meshes.len());
        part.id
    }

    /// Update a part's world transform
    pub fn update_part_transform(&mut self, queue: &wgpu::Queue, part_id: Uuid, transform: Mat4) {
        if let Some(entry) = self.meshes.get_mut(&part_id) {
            entry.data.update_transform(queue, transform);
        }
    }

    /// Update a part's display color
    pub fn update_part_color(&mut self, queue: &wgpu::Queue, part_id: Uuid, color: [f32; 4]) {
        if let Some(entry) = self.meshes.get_mut(&part_id) {
            entry.data.update_color(queue, color);
        }
    }

    /// Remove all parts (model unloaded or replaced)
    pub fn clear_parts(&mut self) {
        self.meshes.clear();
    }

    pub fn has_part(&self, part_id: Uuid) -> bool {
        self.meshes.contains_key(&part_id)
    }

    pub fn part_count(&self) -> usize {
        self.meshes.len()
    }

    /// Render the scene to the given view
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        queue: &wgpu::Queue,
    ) {
        self.update_camera(queue);

        let color_attachment = if let Some(msaa_view) = &self.msaa_view {
            // Render to the multisample texture, resolve to the output
            wgpu::RenderPassColorAttachment {
                view: msaa_view,
                resolve_target: Some(view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            }
        } else {
            wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            }
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Viewport Render Pass"),
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if self.show_grid {
            self.grid_renderer.render(&mut render_pass);
        }

        for entry in self.meshes.values() {
            self.mesh_renderer
                .render(&mut render_pass, &entry.data, &entry.bind_group);
        }
    }
}
