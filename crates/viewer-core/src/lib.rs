//! URDF Viewer Core Data Structures
//!
//! This crate contains the model layer of the viewer:
//! - RobotModel: joints, scene node tree, visual parts
//! - Loading: URDF parsing and mesh/primitive geometry
//! - Kinematics: world transforms with joint values applied

pub mod kinematics;
pub mod load;
pub mod mesh;
pub mod primitive;
pub mod robot;
pub mod scene;

pub use load::*;
pub use mesh::*;
pub use robot::*;
pub use scene::*;
