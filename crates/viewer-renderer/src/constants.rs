//! Rendering constants and configuration
//!
//! This module centralizes the magic numbers used across the renderer.

/// Grid rendering constants
pub mod grid {
    /// Grid extent (half-size in each direction)
    pub const DEFAULT_SIZE: f32 = 10.0;
    /// Grid line spacing
    pub const DEFAULT_SPACING: f32 = 1.0;
    /// Extra margin around the model when fitting the grid to it
    pub const FIT_MARGIN: f32 = 1.25;
    /// Grid line color (gray)
    pub const LINE_COLOR: [f32; 3] = [0.3, 0.3, 0.3];
    /// X-axis color (red)
    pub const X_AXIS_COLOR: [f32; 3] = [0.8, 0.2, 0.2];
    /// Y-axis color (green)
    pub const Y_AXIS_COLOR: [f32; 3] = [0.2, 0.8, 0.2];
}

/// Camera default parameters
pub mod camera {
    /// Default field of view in degrees
    pub const DEFAULT_FOV_DEGREES: f32 = 40.0;
    /// Default near clipping plane
    pub const DEFAULT_NEAR: f32 = 0.1;
    /// Default far clipping plane
    pub const DEFAULT_FAR: f32 = 100000.0;
    /// Default orbit distance
    pub const DEFAULT_DISTANCE: f32 = 5.0;
    /// Default yaw angle in degrees
    pub const DEFAULT_YAW_DEGREES: f32 = 45.0;
    /// Default pitch angle in degrees
    pub const DEFAULT_PITCH_DEGREES: f32 = 30.0;
    /// Minimum pitch angle in degrees
    pub const MIN_PITCH_DEGREES: f32 = -89.0;
    /// Maximum pitch angle in degrees
    pub const MAX_PITCH_DEGREES: f32 = 89.0;
    /// Pan sensitivity multiplier
    pub const PAN_SCALE: f32 = 0.002;
    /// Zoom sensitivity multiplier
    pub const ZOOM_SCALE: f32 = 0.1;
    /// Minimum orbit distance
    pub const MIN_DISTANCE: f32 = 0.1;
    /// Maximum orbit distance
    pub const MAX_DISTANCE: f32 = 10000.0;
    /// Fit-all radius multiplier
    pub const FIT_ALL_MULTIPLIER: f32 = 2.5;
}

/// Mesh rendering constants
pub mod mesh {
    /// Base color for parts whose URDF visual carries no material
    pub const DEFAULT_PART_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];
}

/// Viewport rendering constants
pub mod viewport {
    /// MSAA sample count
    pub const SAMPLE_COUNT: u32 = 4;
    /// Background clear color
    pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
        r: 0.15,
        g: 0.15,
        b: 0.18,
        a: 1.0,
    };
}
