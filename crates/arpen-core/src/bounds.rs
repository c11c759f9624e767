//! Axis-aligned bounding boxes

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::corners::Corner;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box.
    pub min: Vec3,
    /// Maximum corner of the bounding box.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a new bounding box from min and max points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) bounding box.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Creates a bounding box from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates a bounding box that contains all given points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |bbox, point| bbox.expand_to_include(point))
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents of the bounding box.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns the size (full extents) of the bounding box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the bounding sphere.
    pub fn radius(&self) -> f32 {
        self.half_extents().length()
    }

    /// Position of one of the eight corners.
    pub fn corner(&self, corner: Corner) -> Vec3 {
        self.center() + self.half_extents() * corner.signs()
    }

    /// Returns true if the bounding box contains the given point.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the union of two bounding boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns a new bounding box expanded to include the given point.
    pub fn expand_to_include(&self, point: Vec3) -> BoundingBox {
        BoundingBox {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Transforms the bounding box by the given matrix.
    ///
    /// The result is the axis-aligned box around the transformed corners,
    /// which may be larger than the oriented box.
    pub fn transform(&self, transform: &Mat4) -> BoundingBox {
        BoundingBox::from_points(
            Corner::ALL.map(|corner| transform.transform_point3(self.corner(corner))),
        )
    }

    /// Returns true if the bounding box is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.05))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Vec3::ZERO);
        assert_eq!(bbox.half_extents(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_bounding_box_contains_point() {
        let bbox = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(bbox.contains_point(Vec3::ZERO));
        assert!(bbox.contains_point(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!bbox.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_bounding_box_corner() {
        let bbox = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(bbox.corner(Corner::Lbd), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.corner(Corner::Rfu), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(bbox.corner(Corner::Rbd), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_box_grows_from_points() {
        assert!(!BoundingBox::empty().is_valid());
        let bbox = BoundingBox::from_points([Vec3::X, Vec3::NEG_Y, Vec3::Z]);
        assert!(bbox.is_valid());
        assert_eq!(bbox.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_transform_translates_box() {
        let bbox = BoundingBox::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let moved = bbox.transform(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(moved.center(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(moved.half_extents(), Vec3::ONE);
    }
}
