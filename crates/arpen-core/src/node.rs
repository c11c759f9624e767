//! Scene nodes and their transforms

use std::fmt;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bounds::BoundingBox;
use crate::corners::{Corner, CornerSet, Edge};

/// Stable handle to a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node transform with a movable pivot.
///
/// A local point `p` lands in world space at
/// `position + orientation * (scale * (p - pivot))`, so the pivot is the
/// local point that sits exactly at `position` and stays fixed while the
/// scale or orientation changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
    #[serde(default)]
    pub pivot: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        scale: Vec3::ONE,
        pivot: Vec3::ZERO,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Local point to world space.
    pub fn apply(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * (self.scale * (local - self.pivot))
    }

    /// World point to local space.
    pub fn inverse_apply(&self, world: Vec3) -> Vec3 {
        self.pivot + (self.orientation.inverse() * (world - self.position)) / self.scale
    }

    /// World direction into the node frame. Rotation only, so unit vectors
    /// stay unit-length under non-uniform scale.
    pub fn world_to_local_vector(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse() * world
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
            * Mat4::from_translation(-self.pivot)
    }

    /// Move the pivot to another local point without moving the node visually.
    pub fn set_pivot_preserving(&mut self, pivot: Vec3) {
        let anchor = self.apply(pivot);
        self.pivot = pivot;
        self.position = anchor;
    }

    /// Compose a rotation expressed in the node's own frame.
    pub fn local_rotate(&mut self, delta: Quat) {
        self.orientation = (self.orientation * delta).normalize();
    }

    /// Rotate about a local point so that point keeps its world position.
    pub fn local_rotate_about(&mut self, delta: Quat, local_point: Vec3) {
        let before = self.apply(local_point);
        self.local_rotate(delta);
        let after = self.apply(local_point);
        self.position += before - after;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }
}

/// What a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A manipulable study object (or a container of them)
    Object,
    /// Cube marker drawn at a bounding-box corner
    CornerMarker { owner: NodeId, corner: Corner },
    /// Marker drawn at a bounding-box edge midpoint
    EdgeMarker { owner: NodeId, edge: Edge },
    /// The pointer's own visual
    Pointer,
    /// Hit-testable study surface (table, wall plane)
    Surface,
    /// Target orientation model for rotation tasks
    Reference,
}

/// Visual state flags read by styling outside the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    pub highlighted: bool,
    pub selected: bool,
    pub visited: bool,
}

/// A node in the scene graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    /// Geometry extent in the node's local frame
    pub local_bounds: BoundingBox,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub flags: NodeFlags,
    /// Hidden nodes are skipped by hit-testing
    #[serde(default)]
    pub hidden: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            local_bounds: BoundingBox::default(),
            parent: None,
            children: Vec::new(),
            flags: NodeFlags::default(),
            hidden: false,
        }
    }

    /// Shorthand for a box-shaped study object.
    pub fn object(name: impl Into<String>, position: Vec3, half_extents: Vec3) -> Self {
        Self::new(name, NodeKind::Object)
            .with_transform(Transform::from_position(position))
            .with_bounds(BoundingBox::from_center_half_extents(Vec3::ZERO, half_extents))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.local_bounds = bounds;
        self
    }

    /// Axis-aligned world bounds.
    pub fn world_bounds(&self) -> BoundingBox {
        self.local_bounds.transform(&self.transform.matrix())
    }

    /// World position of the local bounds center.
    pub fn world_center(&self) -> Vec3 {
        self.transform.apply(self.local_bounds.center())
    }

    pub fn corner_set(&self) -> CornerSet {
        CornerSet::from_transform(&self.transform, &self.local_bounds)
    }

    /// Only study objects can be hovered or selected.
    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, NodeKind::Object)
    }
}
