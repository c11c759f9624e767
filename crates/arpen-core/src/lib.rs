//! ARPen core data model
//!
//! Scene nodes, transforms, bounding boxes and the 8-corner box model shared
//! by every manipulation technique, plus the engine configuration.

pub mod bounds;
pub mod buckets;
pub mod config;
pub mod constants;
pub mod corners;
pub mod input;
pub mod math;
pub mod node;
pub mod scene;

pub use bounds::BoundingBox;
pub use buckets::{SpeedBucket, SpeedBuckets};
pub use config::*;
pub use corners::{Corner, CornerSet, Diagonal, Edge};
pub use input::{Button, ButtonState};
pub use node::{NodeFlags, NodeId, NodeKind, SceneNode, Transform};
pub use scene::{CornerMarkers, EdgeMarkers, Scene, SceneError};
