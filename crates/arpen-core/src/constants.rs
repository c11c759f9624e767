//! Global constants for arpen-core

/// Seconds between two releases of the same button that count as a double-click
pub const DOUBLE_CLICK_WINDOW: f32 = 0.5;

/// Seconds the select button must be held before a drag starts
pub const DRAG_HOLD_TIME: f32 = 1.0;

/// Pointer travel (scene units) since the press that starts a drag
pub const DRAG_DISTANCE: f32 = 0.015;

/// Smallest scale factor a scaling technique may apply
pub const MIN_SCALE_FACTOR: f32 = 0.2;

/// Edge length of the cube marker drawn at each bounding-box corner
pub const CORNER_MARKER_SIZE: f32 = 0.01;

/// Frame-to-frame rotation (degrees) above which a pointer sample is treated as a glitch
pub const MAX_FRAME_ROTATION_DEGREES: f32 = 20.0;

/// Degrees of rotation per pixel of touchscreen pan
pub const TOUCH_DEGREES_PER_PIXEL: f32 = 1.0;

/// Tolerance for degenerate lengths and factors
pub const GEOMETRY_EPSILON: f32 = 1e-6;

/// Scene file format version
pub const SCENE_FORMAT_VERSION: u32 = 1;
