//! Ground grid renderer
//!
//! The grid covers the Z=0 plane under the model and regrows to match the
//! model's footprint when one is installed, so large robots never hang over
//! the edge of a tiny default grid.

use wgpu::util::DeviceExt;

use crate::constants::grid as constants;
use crate::pipeline::{PipelineConfig, create_camera_bind_group};
use crate::vertex::PositionColorVertex;

pub struct GridRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    bind_group: wgpu::BindGroup,
    extent: f32,
}

impl GridRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
    ) -> Self {
        let bind_group =
            create_camera_bind_group(device, camera_bind_group_layout, camera_buffer, "Grid");

        let pipeline = PipelineConfig::new(
            "Grid",
            include_str!("shaders/grid.wgsl"),
            format,
            depth_format,
            &[camera_bind_group_layout],
        )
        .with_vertex_layouts(vec![PositionColorVertex::layout()])
        .with_topology(wgpu::PrimitiveTopology::LineList)
        .build(device);

        let extent = constants::DEFAULT_SIZE;
        let (vertex_buffer, vertex_count) = Self::build_vertex_buffer(device, extent);

        Self {
            pipeline,
            vertex_buffer,
            vertex_count,
            bind_group,
            extent,
        }
    }

    /// Regenerate the grid to cover a model of the given bounding radius.
    ///
    /// No-op when the snapped extent already matches, so installing the same
    /// model twice does not churn buffers.
    pub fn fit_to_radius(&mut self, device: &wgpu::Device, radius: f32) {
        let extent = extent_for_radius(radius, constants::DEFAULT_SPACING);
        if extent == self.extent {
            return;
        }

        let (vertex_buffer, vertex_count) = Self::build_vertex_buffer(device, extent);
        self.vertex_buffer = vertex_buffer;
        self.vertex_count = vertex_count;
        self.extent = extent;
    }

    fn build_vertex_buffer(device: &wgpu::Device, extent: f32) -> (wgpu::Buffer, u32) {
        let vertices = generate_grid_vertices(extent, constants::DEFAULT_SPACING);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        (buffer, vertices.len() as u32)
    }

    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

/// Grid half-size covering a bounding radius, snapped up to a whole number
/// of spacing steps and never below the default size.
fn extent_for_radius(radius: f32, spacing: f32) -> f32 {
    let padded = radius * constants::FIT_MARGIN;
    let snapped = (padded / spacing).ceil() * spacing;
    snapped.max(constants::DEFAULT_SIZE)
}

/// Line vertices for a square grid in the Z=0 plane.
///
/// One pass emits the pair of perpendicular lines at each step; the two
/// center lines double as tinted X and Y axis markers.
fn generate_grid_vertices(extent: f32, spacing: f32) -> Vec<PositionColorVertex> {
    let steps = (extent / spacing) as i32;
    let mut vertices = Vec::with_capacity(((steps * 2 + 1) * 4) as usize);

    let mut line = |from: [f32; 3], to: [f32; 3], color: [f32; 3]| {
        vertices.push(PositionColorVertex {
            position: from,
            color,
        });
        vertices.push(PositionColorVertex {
            position: to,
            color,
        });
    };

    for i in -steps..=steps {
        let offset = i as f32 * spacing;

        let x_color = if i == 0 {
            constants::X_AXIS_COLOR
        } else {
            constants::LINE_COLOR
        };
        line([-extent, offset, 0.0], [extent, offset, 0.0], x_color);

        let y_color = if i == 0 {
            constants::Y_AXIS_COLOR
        } else {
            constants::LINE_COLOR
        };
        line([offset, -extent, 0.0], [offset, extent, 0.0], y_color);
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_vertex_count() {
        // 21 steps, 2 perpendicular lines per step, 2 vertices per line
        let vertices = generate_grid_vertices(10.0, 1.0);
        assert_eq!(vertices.len(), 21 * 2 * 2);
    }

    #[test]
    fn test_grid_lies_in_ground_plane() {
        let vertices = generate_grid_vertices(5.0, 1.0);
        assert!(vertices.iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn test_center_lines_are_axis_tinted() {
        let vertices = generate_grid_vertices(3.0, 1.0);
        let on_x_axis: Vec<_> = vertices
            .iter()
            .filter(|v| v.color == constants::X_AXIS_COLOR)
            .collect();
        assert_eq!(on_x_axis.len(), 2);
        assert!(on_x_axis.iter().all(|v| v.position[1] == 0.0));

        let on_y_axis: Vec<_> = vertices
            .iter()
            .filter(|v| v.color == constants::Y_AXIS_COLOR)
            .collect();
        assert_eq!(on_y_axis.len(), 2);
        assert!(on_y_axis.iter().all(|v| v.position[0] == 0.0));
    }

    #[test]
    fn test_extent_snaps_up_and_never_shrinks_below_default() {
        // Small model keeps the default footprint
        assert_eq!(extent_for_radius(1.0, 1.0), constants::DEFAULT_SIZE);
        // Large model grows the grid, padded and snapped to whole steps
        assert_eq!(extent_for_radius(20.0, 1.0), 25.0);
        assert_eq!(extent_for_radius(20.1, 1.0), 26.0);
    }
}
