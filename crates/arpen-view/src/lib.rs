//! ARPen view substrate
//!
//! The seam between the manipulation engine and whatever renders the scene:
//! screen projection, unprojection and ray hit-testing.
//!
//! # Module Structure
//!
//! ```text
//! arpen-view/
//! ├── camera.rs      # Pinhole / orthographic camera, NDC mapping
//! ├── config.rs      # ViewportConfig (RON-serializable)
//! ├── picking.rs     # Ray-box and ray-sphere tests
//! ├── substrate.rs   # Substrate trait and Hit
//! └── viewport.rs    # SoftwareViewport, a CPU implementation of Substrate
//! ```

pub mod camera;
pub mod config;
pub mod picking;
pub mod substrate;
pub mod viewport;

pub use camera::{Camera, Projection};
pub use config::ViewportConfig;
pub use substrate::{Hit, Substrate};
pub use viewport::SoftwareViewport;
