//! WGPU-based 3D rendering for the robot viewer

pub mod camera;
pub mod constants;
pub mod grid;
pub mod mesh;
pub mod pick;
pub mod pipeline;
pub mod renderer;
pub mod vertex;

pub use camera::*;
pub use pick::*;
pub use renderer::*;
