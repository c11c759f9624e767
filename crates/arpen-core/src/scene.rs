//! Scene registry and scene file serialization

use std::collections::HashMap;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::constants::SCENE_FORMAT_VERSION;
use crate::corners::{Corner, Edge};
use crate::node::{NodeId, NodeKind, SceneNode, Transform};

/// Serialization format for scene files
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneData {
    version: u32,
    name: String,
    nodes: Vec<SceneNode>,
}

/// All nodes taking part in a study task
#[derive(Debug, Clone)]
pub struct Scene {
    /// File format version
    pub version: u32,
    pub name: String,
    nodes: HashMap<NodeId, SceneNode>,
    /// Insertion order, kept so files and iteration are deterministic
    order: Vec<NodeId>,
    pointer: Option<NodeId>,
}

/// Handles to the eight corner markers of one object, resolved once at selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerMarkers {
    pub owner: NodeId,
    ids: [NodeId; 8],
}

impl CornerMarkers {
    pub fn get(&self, corner: Corner) -> NodeId {
        self.ids[corner.index()]
    }

    pub fn ids(&self) -> &[NodeId; 8] {
        &self.ids
    }

    /// Which corner a marker node stands for.
    pub fn corner_of(&self, id: NodeId) -> Option<Corner> {
        self.ids
            .iter()
            .position(|m| *m == id)
            .map(Corner::from_index)
    }
}

/// Handles to the twelve edge-midpoint markers of one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMarkers {
    pub owner: NodeId,
    ids: [NodeId; 12],
}

impl EdgeMarkers {
    pub fn get(&self, edge: Edge) -> NodeId {
        self.ids[edge.index()]
    }

    pub fn ids(&self) -> &[NodeId; 12] {
        &self.ids
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Serialize for Scene {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = SceneData {
            version: self.version,
            name: self.name.clone(),
            nodes: self.iter().cloned().collect(),
        };
        data.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Scene {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = SceneData::deserialize(deserializer)?;
        let mut scene = Scene::new(data.name);
        scene.version = data.version;
        for node in data.nodes {
            scene.insert_raw(node);
        }
        Ok(scene)
    }
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SCENE_FORMAT_VERSION,
            name: name.into(),
            nodes: HashMap::new(),
            order: Vec::new(),
            pointer: None,
        }
    }

    /// Save scene to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| SceneError::Io(e.to_string()))?;
        Ok(())
    }

    /// Serialize scene to RON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, SceneError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load scene from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| SceneError::Io(e.to_string()))?;
        let scene: Scene =
            ron::from_str(&content).map_err(|e| SceneError::Deserialize(e.to_string()))?;
        tracing::info!("Loaded scene '{}' with {} nodes", scene.name, scene.len());
        Ok(scene)
    }

    /// Load scene from RON bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, SceneError> {
        let content =
            std::str::from_utf8(data).map_err(|e| SceneError::Deserialize(e.to_string()))?;
        ron::from_str(content).map_err(|e| SceneError::Deserialize(e.to_string()))
    }

    // ============== Node Accessors ==============

    /// Add a node; if it names a parent, it is linked under that parent.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            if !parent.children.contains(&id) {
                parent.children.push(id);
            }
        }
        self.insert_raw(node);
        id
    }

    /// Add a node under an existing parent.
    pub fn insert_child(&mut self, parent: NodeId, mut node: SceneNode) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        node.parent = Some(parent);
        Ok(self.insert(node))
    }

    fn insert_raw(&mut self, node: SceneNode) {
        let id = node.id;
        if node.kind == NodeKind::Pointer {
            self.pointer = Some(id);
        }
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a node together with its descendants.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);
        if self.pointer == Some(id) {
            self.pointer = None;
        }
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for child in &node.children {
            self.remove(*child);
        }
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate over nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Named lookup, used while setting up a task.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|n| n.name == name).map(|n| n.id)
    }

    /// First node of a kind, e.g. the reference model.
    pub fn find_kind(&self, kind: NodeKind) -> Option<NodeId> {
        self.iter().find(|n| n.kind == kind).map(|n| n.id)
    }

    /// The pointer's own visual, if the scene has one.
    pub fn pointer(&self) -> Option<NodeId> {
        self.pointer
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(&id).map(|n| n.transform)
    }

    pub fn world_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        self.nodes.get(&id).map(|n| n.world_bounds())
    }

    /// A node followed by all of its descendants, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if out.contains(&next) {
                continue;
            }
            if let Some(node) = self.nodes.get(&next) {
                out.push(next);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// World bounds of a node grown to cover its descendants.
    pub fn subtree_bounds(&self, id: NodeId) -> Option<BoundingBox> {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| self.world_bounds(n))
            .reduce(|acc, b| acc.union(&b))
    }

    // ============== Flags ==============

    /// Returns false if the node does not exist.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> bool {
        self.nodes
            .get_mut(&id)
            .map(|n| n.flags.selected = selected)
            .is_some()
    }

    pub fn set_highlighted(&mut self, id: NodeId, highlighted: bool) -> bool {
        self.nodes
            .get_mut(&id)
            .map(|n| n.flags.highlighted = highlighted)
            .is_some()
    }

    pub fn set_visited(&mut self, id: NodeId, visited: bool) -> bool {
        self.nodes
            .get_mut(&id)
            .map(|n| n.flags.visited = visited)
            .is_some()
    }

    // ============== Markers ==============

    /// Create cube markers at the eight corners of `owner`.
    pub fn spawn_corner_markers(&mut self, owner: NodeId, size: f32) -> Result<CornerMarkers, SceneError> {
        let node = self.get(owner).ok_or(SceneError::UnknownNode(owner))?;
        let set = node.corner_set();
        let owner_name = node.name.clone();
        let ids = Corner::ALL.map(|corner| {
            self.insert(marker_node(
                format!("{owner_name}/{}", corner.name()),
                NodeKind::CornerMarker { owner, corner },
                set.corner(corner),
                size,
            ))
        });
        tracing::debug!("Spawned corner markers for {}", owner_name);
        Ok(CornerMarkers { owner, ids })
    }

    /// Create markers at the twelve edge midpoints of `owner`.
    pub fn spawn_edge_markers(&mut self, owner: NodeId, size: f32) -> Result<EdgeMarkers, SceneError> {
        let node = self.get(owner).ok_or(SceneError::UnknownNode(owner))?;
        let set = node.corner_set();
        let owner_name = node.name.clone();
        let ids = Edge::ALL.map(|edge| {
            self.insert(marker_node(
                format!("{owner_name}/edge{}", edge.index()),
                NodeKind::EdgeMarker { owner, edge },
                set.edge_midpoint(edge),
                size,
            ))
        });
        Ok(EdgeMarkers { owner, ids })
    }

    pub fn despawn(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.remove(id);
        }
    }

    /// Move corner (and optionally edge) markers onto the owner's current
    /// corner set. Returns false if the owner or any marker is missing;
    /// markers that do exist are still moved.
    pub fn sync_markers(&mut self, corners: &CornerMarkers, edges: Option<&EdgeMarkers>) -> bool {
        let Some(set) = self.get(corners.owner).map(|n| n.corner_set()) else {
            return false;
        };
        let mut complete = true;
        for corner in Corner::ALL {
            match self.get_mut(corners.get(corner)) {
                Some(marker) => marker.transform.position = set.corner(corner),
                None => complete = false,
            }
        }
        if let Some(edges) = edges {
            for edge in Edge::ALL {
                match self.get_mut(edges.get(edge)) {
                    Some(marker) => marker.transform.position = set.edge_midpoint(edge),
                    None => complete = false,
                }
            }
        }
        complete
    }
}

fn marker_node(name: String, kind: NodeKind, position: Vec3, size: f32) -> SceneNode {
    SceneNode::new(name, kind)
        .with_transform(Transform::from_position(position))
        .with_bounds(BoundingBox::from_center_half_extents(
            Vec3::ZERO,
            Vec3::splat(size * 0.5),
        ))
}

/// Scene-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
}
