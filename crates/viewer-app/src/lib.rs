//! URDF viewer application
//!
//! egui/eframe frontend: loads one robot model, renders it in the 3D
//! viewport, and lets the user pose individual joints by dragging.

pub mod app;
pub mod interaction;
pub mod loader;
pub mod panels;
pub mod viewport_state;

pub use app::ViewerApp;
