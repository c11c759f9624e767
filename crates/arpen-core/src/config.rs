//! Engine configuration
//!
//! Thresholds and policies shared by the manipulation techniques. Loaded
//! from and saved to RON files so a study run can be reproduced exactly.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::buckets::SpeedBuckets;
use crate::constants::*;

/// Button edge detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Max seconds between two releases that form a double-click
    pub double_click_window: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            double_click_window: DOUBLE_CLICK_WINDOW,
        }
    }
}

/// Drag activation for free arrangement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DragConfig {
    /// Seconds held before a drag starts
    pub hold_time: f32,
    /// Pointer travel since the press before a drag starts
    pub distance: f32,
    /// Jump the selection under the pointer when the drag starts
    pub snap: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            hold_time: DRAG_HOLD_TIME,
            distance: DRAG_DISTANCE,
            snap: true,
        }
    }
}

/// Which measurement drives the scale factor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthAxis {
    /// Object's local X extent
    X,
    /// Object's local Y extent (vertical for an upright object)
    #[default]
    Y,
    /// Object's local Z extent
    Z,
    /// Length of the corner-to-antipode diagonal
    Diagonal,
}

impl GrowthAxis {
    /// Local unit axis, or `None` for the diagonal rule.
    pub fn unit(self) -> Option<Vec3> {
        match self {
            GrowthAxis::X => Some(Vec3::X),
            GrowthAxis::Y => Some(Vec3::Y),
            GrowthAxis::Z => Some(Vec3::Z),
            GrowthAxis::Diagonal => None,
        }
    }
}

/// How one measured factor maps onto the three scale components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    /// All three components scale together, keeping proportions
    #[default]
    Uniform,
    /// Each local axis follows the pointer's offset along that axis
    PerAxis,
}

/// How the diagonal scaler turns the projected screen point back into 3-D
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagonalRecovery {
    /// Ray-cast at the projected point; skip the frame on a miss
    #[default]
    HitTest,
    /// Unproject at the selected corner's screen depth; never misses
    CornerDepth,
}

/// Point kept fixed while scaling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleAnchor {
    #[default]
    OppositeCorner,
    Center,
}

/// Where a rotation technique reads its orientation from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationSource {
    /// Handheld or head-mounted camera attitude
    #[default]
    Device,
    /// Orientation of the pointer tip
    Pointer,
}

/// Scaling thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScalingConfig {
    /// Smallest factor applied relative to the size at activation
    pub min_scale_factor: f32,
    /// Edge length of corner markers
    pub marker_size: f32,
    /// Default recovery policy for the hit-test based scalers
    pub recovery: DiagonalRecovery,
    /// Show edge-midpoint markers along with corner markers
    pub edge_markers: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_scale_factor: MIN_SCALE_FACTOR,
            marker_size: CORNER_MARKER_SIZE,
            recovery: DiagonalRecovery::HitTest,
            edge_markers: false,
        }
    }
}

/// Rotation thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotationConfig {
    pub buckets: SpeedBuckets,
    /// Frame deltas at or above this many degrees are dropped as tracking glitches
    pub max_frame_delta: Option<f32>,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            buckets: SpeedBuckets::default(),
            max_frame_delta: Some(MAX_FRAME_ROTATION_DEGREES),
        }
    }
}

/// Touchscreen gesture mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TouchConfig {
    pub degrees_per_pixel: f32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            degrees_per_pixel: TOUCH_DEGREES_PER_PIXEL,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub input: InputConfig,
    pub drag: DragConfig,
    pub scaling: ScalingConfig,
    pub rotation: RotationConfig,
    pub touch: TouchConfig,
}

impl EngineConfig {
    /// Load configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse and validate RON text
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            ron::from_str(content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Reject thresholds that would make a technique misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("input.double_click_window", self.input.double_click_window),
            ("drag.hold_time", self.drag.hold_time),
            ("drag.distance", self.drag.distance),
            ("scaling.min_scale_factor", self.scaling.min_scale_factor),
            ("scaling.marker_size", self.scaling.marker_size),
            ("touch.degrees_per_pixel", self.touch.degrees_per_pixel),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
        }
        if let Some(max) = self.rotation.max_frame_delta {
            if !(max > 0.0 && max <= 180.0) {
                return Err(ConfigError::Invalid(format!(
                    "rotation.max_frame_delta must be in (0, 180], got {max}"
                )));
            }
        }
        if !self.rotation.buckets.is_monotonic() {
            return Err(ConfigError::Invalid(
                "rotation.buckets must rise in both threshold and step".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
