//! Robot part mesh renderer

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use viewer_core::VisualPart;

use crate::constants::mesh::DEFAULT_PART_COLOR;
use crate::pipeline::{PipelineConfig, create_camera_bind_group};

/// Vertex for mesh rendering
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: std::mem::size_of::<[f32; 3]>() as u64,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Self::ATTRIBUTES,
        }
    }
}

/// Per-part instance uniform: world transform and current display color.
///
/// Color lives here rather than in the vertex buffer so highlight changes
/// are a single small buffer write.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl Default for MeshInstance {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: DEFAULT_PART_COLOR,
        }
    }
}

/// GPU mesh data for one part
pub struct MeshData {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub instance: MeshInstance,
    pub instance_buffer: wgpu::Buffer,
}

impl MeshData {
    /// Create GPU buffers from a visual part.
    ///
    /// Per-triangle normals are expanded into flat-shaded vertices.
    pub fn from_part(device: &wgpu::Device, part: &VisualPart) -> Self {
        let mut vertices = Vec::with_capacity(part.indices.len());

        for (i, chunk) in part.indices.chunks(3).enumerate() {
            if chunk.len() != 3 {
                continue;
            }

            let normal = part.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]);
            for &idx in chunk {
                vertices.push(MeshVertex {
                    position: part.vertices[idx as usize],
                    normal,
                });
            }
        }

        let indices: Vec<u32> = (0..vertices.len() as u32).collect();

        tracing::debug!(
            "Mesh buffers for '{}': {} vertices, {} triangles",
            part.name,
            vertices.len(),
            indices.len() / 3
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance = MeshInstance {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: part.color.unwrap_or(DEFAULT_PART_COLOR),
        };

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Instance Buffer"),
            contents: bytemuck::cast_slice(&[instance]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            instance,
            instance_buffer,
        }
    }

    /// Update the instance's world transform
    pub fn update_transform(&mut self, queue: &wgpu::Queue, transform: Mat4) {
        self.instance.model = transform.to_cols_array_2d();
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance]),
        );
    }

    /// Update the instance's display color
    pub fn update_color(&mut self, queue: &wgpu::Queue, color: [f32; 4]) {
        self.instance.color = color;
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance]),
        );
    }
}

/// Mesh renderer
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    instance_bind_group_layout: wgpu::BindGroupLayout,
}

impl MeshRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
    ) -> Self {
        let camera_bind_group =
            create_camera_bind_group(device, camera_bind_group_layout, camera_buffer, "Mesh");

        // Per-mesh instance bind group layout (transform/color)
        let instance_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Mesh Instance Bind Group Layout"),
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

        let pipeline = PipelineConfig::new(
            "Mesh",
            include_str!("shaders/mesh.wgsl"),
            format,
            depth_format,
            &[camera_bind_group_layout, &instance_bind_group_layout],
        )
        .with_vertex_layouts(vec![MeshVertex::layout()])
        .build(device);

        Self {
            pipeline,
            camera_bind_group,
            instance_bind_group_layout,
        }
    }

    /// Create bind group for a mesh instance
    pub fn create_instance_bind_group(
        &self,
        device: &wgpu::Device,
        mesh: &MeshData,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Instance Bind Group"),
            layout: &self.instance_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: mesh.instance_buffer.as_entire_binding(),
            }],
        })
    }

    pub fn render<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        mesh: &'a MeshData,
        instance_bind_group: &'a wgpu::BindGroup,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_bind_group(1, instance_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
