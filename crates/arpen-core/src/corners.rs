//! Eight-corner bounding-box model
//!
//! Corners are indexed by three bits: bit 0 is right (+X), bit 1 is front
//! (+Z) and bit 2 is up (+Y). Flipping every bit gives the antipodal corner;
//! flipping exactly one bit walks along an edge.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::node::Transform;

/// One of the eight bounding-box corners.
///
/// Variant names read left/right, back/front, down/up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    Lbd = 0,
    Rbd = 1,
    Lfd = 2,
    Rfd = 3,
    Lbu = 4,
    Rbu = 5,
    Lfu = 6,
    Rfu = 7,
}

impl Corner {
    /// All corners in index order.
    pub const ALL: [Corner; 8] = [
        Corner::Lbd,
        Corner::Rbd,
        Corner::Lfd,
        Corner::Rfd,
        Corner::Lbu,
        Corner::Rbu,
        Corner::Lfu,
        Corner::Rfu,
    ];

    /// Corner for a bit index; only the low three bits are used.
    pub fn from_index(index: usize) -> Corner {
        Self::ALL[index & 0b111]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// The corner diagonally opposite through the box center.
    pub fn antipode(self) -> Corner {
        Self::from_index(self.index() ^ 0b111)
    }

    /// Unit sign per axis (`-1` or `+1`).
    pub fn signs(self) -> Vec3 {
        let sign = |bit: usize| if self.index() & bit != 0 { 1.0 } else { -1.0 };
        Vec3::new(sign(0b001), sign(0b100), sign(0b010))
    }

    /// The three edges meeting at this corner.
    pub fn edges(self) -> [Edge; 3] {
        let mut out = [Edge::BackDown; 3];
        let mut n = 0;
        for edge in Edge::ALL {
            let (a, b) = edge.corners();
            if a == self || b == self {
                out[n] = edge;
                n += 1;
            }
        }
        out
    }

    /// Short study name, e.g. `"lbd"`.
    pub fn name(self) -> &'static str {
        match self {
            Corner::Lbd => "lbd",
            Corner::Rbd => "rbd",
            Corner::Lfd => "lfd",
            Corner::Rfd => "rfd",
            Corner::Lbu => "lbu",
            Corner::Rbu => "rbu",
            Corner::Lfu => "lfu",
            Corner::Rfu => "rfu",
        }
    }

    /// Parse a short study name.
    pub fn from_name(name: &str) -> Option<Corner> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// One of the twelve bounding-box edges, named by the two fixed sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    BackDown,
    FrontDown,
    BackUp,
    FrontUp,
    LeftDown,
    RightDown,
    LeftUp,
    RightUp,
    LeftBack,
    RightBack,
    LeftFront,
    RightFront,
}

impl Edge {
    pub const ALL: [Edge; 12] = [
        Edge::BackDown,
        Edge::FrontDown,
        Edge::BackUp,
        Edge::FrontUp,
        Edge::LeftDown,
        Edge::RightDown,
        Edge::LeftUp,
        Edge::RightUp,
        Edge::LeftBack,
        Edge::RightBack,
        Edge::LeftFront,
        Edge::RightFront,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// End corners, lower index first.
    pub fn corners(self) -> (Corner, Corner) {
        let (a, b) = match self {
            // along X
            Edge::BackDown => (0, 1),
            Edge::FrontDown => (2, 3),
            Edge::BackUp => (4, 5),
            Edge::FrontUp => (6, 7),
            // along Z
            Edge::LeftDown => (0, 2),
            Edge::RightDown => (1, 3),
            Edge::LeftUp => (4, 6),
            Edge::RightUp => (5, 7),
            // along Y
            Edge::LeftBack => (0, 4),
            Edge::RightBack => (1, 5),
            Edge::LeftFront => (2, 6),
            Edge::RightFront => (3, 7),
        };
        (Corner::from_index(a), Corner::from_index(b))
    }

    /// Local axis the edge runs along.
    pub fn axis(self) -> Vec3 {
        match self.index() / 4 {
            0 => Vec3::X,
            1 => Vec3::Z,
            _ => Vec3::Y,
        }
    }
}

/// One of the four space diagonals (a corner and its antipode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagonal {
    LbdRfu,
    RbdLfu,
    LfdRbu,
    RfdLbu,
}

impl Diagonal {
    pub const ALL: [Diagonal; 4] = [
        Diagonal::LbdRfu,
        Diagonal::RbdLfu,
        Diagonal::LfdRbu,
        Diagonal::RfdLbu,
    ];

    /// The diagonal passing through `corner`.
    pub fn through(corner: Corner) -> Diagonal {
        Self::ALL[corner.index().min(corner.antipode().index())]
    }

    /// End corners, lower index first.
    pub fn corners(self) -> (Corner, Corner) {
        let a = Corner::from_index(self as usize);
        (a, a.antipode())
    }
}

/// World-space corner positions and edge midpoints of one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSet {
    corners: [Vec3; 8],
    edge_midpoints: [Vec3; 12],
}

impl CornerSet {
    /// Corners of the axis-aligned box `center ± half_extents`.
    ///
    /// Zero extents are allowed and collapse every corner onto the center.
    pub fn recompute(center: Vec3, half_extents: Vec3) -> Self {
        Self::from_corners(Corner::ALL.map(|c| center + half_extents * c.signs()))
    }

    /// Corners of an object's local bounds carried through its transform.
    pub fn from_transform(transform: &Transform, local_bounds: &BoundingBox) -> Self {
        Self::from_corners(Corner::ALL.map(|c| transform.apply(local_bounds.corner(c))))
    }

    fn from_corners(corners: [Vec3; 8]) -> Self {
        let edge_midpoints = Edge::ALL.map(|edge| {
            let (a, b) = edge.corners();
            (corners[a.index()] + corners[b.index()]) * 0.5
        });
        Self {
            corners,
            edge_midpoints,
        }
    }

    pub fn corner(&self, corner: Corner) -> Vec3 {
        self.corners[corner.index()]
    }

    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    pub fn edge_midpoint(&self, edge: Edge) -> Vec3 {
        self.edge_midpoints[edge.index()]
    }

    pub fn edge_midpoints(&self) -> &[Vec3; 12] {
        &self.edge_midpoints
    }

    /// End points of a diagonal, lower corner index first.
    pub fn diagonal(&self, diagonal: Diagonal) -> (Vec3, Vec3) {
        let (a, b) = diagonal.corners();
        (self.corner(a), self.corner(b))
    }

    pub fn center(&self) -> Vec3 {
        self.corners.iter().copied().sum::<Vec3>() / 8.0
    }
}
