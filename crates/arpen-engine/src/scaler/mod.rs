//! Corner-anchored scaling
//!
//! All scaling variants funnel into [`ScaleSession`]: on activation the
//! object's pivot moves to the anchor (the antipode of the selected corner,
//! or the box center) without moving the object visually, and every applied
//! factor is relative to the scale captured then. Because the pivot is the
//! anchor, changing the scale leaves the anchor where it is.

pub mod diagonal;
pub mod pinch;
pub mod reference;

use arpen_core::constants::GEOMETRY_EPSILON;
use arpen_core::{
    Corner, CornerMarkers, Diagonal, EdgeMarkers, GrowthAxis, NodeId, ScaleAnchor, ScaleMode, Scene,
};
use arpen_view::Hit;
use glam::Vec3;

use crate::lookup::MissingNodeLog;

/// At most one selected corner; picking it again deselects it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CornerPicker {
    selected: Option<Corner>,
}

impl CornerPicker {
    /// Select `corner`, switching from any other; returns the new selection.
    pub fn tap(&mut self, corner: Corner) -> Option<Corner> {
        self.selected = if self.selected == Some(corner) {
            None
        } else {
            Some(corner)
        };
        self.selected
    }

    pub fn selected(&self) -> Option<Corner> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

/// Corner and edge markers shown around the selected object
#[derive(Debug, Default)]
pub struct MarkerOverlay {
    corners: Option<CornerMarkers>,
    edges: Option<EdgeMarkers>,
}

impl MarkerOverlay {
    pub fn owner(&self) -> Option<NodeId> {
        self.corners.map(|m| m.owner)
    }

    /// Show markers around `target` (or none), respawning only on change.
    pub fn follow(&mut self, scene: &mut Scene, target: Option<NodeId>, size: f32, with_edges: bool) {
        if self.owner() == target {
            return;
        }
        self.hide(scene);
        let Some(target) = target else {
            return;
        };
        match scene.spawn_corner_markers(target, size) {
            Ok(markers) => self.corners = Some(markers),
            Err(e) => {
                tracing::warn!("Could not show corner markers: {}", e);
                return;
            }
        }
        if with_edges {
            self.edges = scene.spawn_edge_markers(target, size * 0.5).ok();
        }
    }

    pub fn hide(&mut self, scene: &mut Scene) {
        if let Some(markers) = self.corners.take() {
            scene.despawn(*markers.ids());
        }
        if let Some(markers) = self.edges.take() {
            scene.despawn(*markers.ids());
        }
    }

    /// Move markers onto the owner's current corners.
    pub fn sync(&self, scene: &mut Scene, missing: &mut MissingNodeLog, technique: &'static str) {
        if let Some(markers) = &self.corners {
            if !scene.sync_markers(markers, self.edges.as_ref()) {
                missing.report(technique, "marker", markers.owner);
            }
        }
    }

    /// Which of our corner markers, if any, is the nearest marker hit.
    pub fn corner_hit(&self, hits: &[Hit]) -> Option<Corner> {
        let markers = self.corners.as_ref()?;
        hits.iter().find_map(|h| markers.corner_of(h.node))
    }
}

/// State of one scaling gesture
#[derive(Debug, Clone)]
pub struct ScaleSession {
    pub target: NodeId,
    /// The corner being pulled
    pub corner: Corner,
    pub anchor: ScaleAnchor,
    anchor_local: Vec3,
    original_pivot: Vec3,
    start_scale: Vec3,
    /// World-space size along each local axis at activation
    start_extent: Vec3,
    /// Corner-to-anchor distance at activation
    start_reach: f32,
    applied: Vec3,
}

impl ScaleSession {
    /// Anchor the target for scaling. `None` if the target is gone.
    pub fn begin(scene: &mut Scene, target: NodeId, corner: Corner, anchor: ScaleAnchor) -> Option<Self> {
        let node = scene.get_mut(target)?;
        let bounds = node.local_bounds;
        let anchor_local = match anchor {
            ScaleAnchor::OppositeCorner => bounds.corner(corner.antipode()),
            ScaleAnchor::Center => bounds.center(),
        };
        let original_pivot = node.transform.pivot;
        node.transform.set_pivot_preserving(anchor_local);
        let start_scale = node.transform.scale;
        let (a, b) = node.corner_set().diagonal(Diagonal::through(corner));
        let start_reach = match anchor {
            ScaleAnchor::OppositeCorner => a.distance(b),
            ScaleAnchor::Center => a.distance(b) * 0.5,
        };
        tracing::debug!(
            "Scaling {} from {} ({:?})",
            node.name,
            corner.name(),
            anchor
        );
        Some(Self {
            target,
            corner,
            anchor,
            anchor_local,
            original_pivot,
            start_scale,
            start_extent: bounds.size() * start_scale.abs(),
            start_reach,
            applied: Vec3::ONE,
        })
    }

    /// Current world position of the anchor.
    pub fn anchor_world(&self, scene: &Scene) -> Option<Vec3> {
        scene
            .get(self.target)
            .map(|n| n.transform.apply(self.anchor_local))
    }

    /// Current world position of the pulled corner.
    pub fn corner_world(&self, scene: &Scene) -> Option<Vec3> {
        scene
            .get(self.target)
            .map(|n| n.transform.apply(n.local_bounds.corner(self.corner)))
    }

    fn span(&self) -> f32 {
        match self.anchor {
            ScaleAnchor::OppositeCorner => 1.0,
            ScaleAnchor::Center => 0.5,
        }
    }

    /// Scale factor that brings the pulled corner out to `point`.
    ///
    /// With a growth axis the factor is `|offset along axis| / original
    /// extent`; with [`GrowthAxis::Diagonal`] it is the ratio of the
    /// anchor-to-point distance to the original corner reach.
    pub fn factor_for_point(&self, scene: &Scene, point: Vec3, axis: GrowthAxis, mode: ScaleMode) -> Option<Vec3> {
        let node = scene.get(self.target)?;
        let offset = point - node.transform.apply(self.anchor_local);
        let local = node.transform.world_to_local_vector(offset);
        let original = self.start_extent * self.span();
        let factor = match (mode, axis.unit()) {
            (ScaleMode::PerAxis, _) => Vec3::select(
                original.cmpgt(Vec3::splat(GEOMETRY_EPSILON)),
                local.abs() / original,
                Vec3::ONE,
            ),
            (ScaleMode::Uniform, Some(unit)) => Vec3::splat(local.dot(unit).abs() / original.dot(unit)),
            (ScaleMode::Uniform, None) => Vec3::splat(offset.length() / self.start_reach),
        };
        Some(factor)
    }

    /// Scale factor for a measured length along the growth axis (or the
    /// full box diagonal).
    pub fn factor_for_length(&self, length: f32, axis: GrowthAxis, mode: ScaleMode) -> Vec3 {
        let original = match axis.unit() {
            Some(unit) => self.start_extent.dot(unit),
            None => self.start_extent.length(),
        };
        let factor = length / original;
        match (mode, axis.unit()) {
            (ScaleMode::PerAxis, Some(unit)) => Vec3::ONE + unit * (factor - 1.0),
            _ => Vec3::splat(factor),
        }
    }

    /// Apply a factor relative to the activation scale.
    ///
    /// Non-finite or non-positive factors leave the object untouched and
    /// return false; others are clamped to `min_factor`.
    pub fn apply(&mut self, scene: &mut Scene, factor: Vec3, min_factor: f32) -> bool {
        if !factor.is_finite() || factor.cmple(Vec3::splat(GEOMETRY_EPSILON)).any() {
            tracing::debug!("Skipping degenerate scale factor {:?}", factor);
            return false;
        }
        let Some(node) = scene.get_mut(self.target) else {
            return false;
        };
        let factor = factor.max(Vec3::splat(min_factor));
        node.transform.scale = self.start_scale * factor;
        self.applied = factor;
        true
    }

    /// Last factor successfully applied
    pub fn applied(&self) -> Vec3 {
        self.applied
    }

    /// Put the pivot back where it was without moving the object.
    pub fn finish(self, scene: &mut Scene) -> bool {
        match scene.get_mut(self.target) {
            Some(node) => {
                node.transform.set_pivot_preserving(self.original_pivot);
                tracing::debug!("Scaling {} finished at {:?}", node.name, self.applied);
                true
            }
            None => false,
        }
    }
}
