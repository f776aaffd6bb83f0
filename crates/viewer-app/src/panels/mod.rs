//! UI panels

pub mod joints;
pub mod viewport;

pub use joints::JointsPanel;
pub use viewport::ViewportPanel;
