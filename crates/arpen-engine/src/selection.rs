//! Hover and selection
//!
//! The pointer is projected to screen space and ray-cast; the first hit
//! that is not the pointer's own visual (or a marker overlay) becomes the
//! hover target, resolved to the selectable object at the current
//! navigation level. The selection set keeps each member's `selected` flag in
//! step with its membership.

use arpen_core::{Button, NodeId, NodeKind, Scene};
use arpen_view::{Hit, Substrate};
use glam::{Vec2, Vec3};

use crate::input::ButtonEvents;

/// Pointer visuals and marker overlays never count as hits on objects.
pub fn is_overlay(scene: &Scene, id: NodeId) -> bool {
    scene.get(id).is_none_or(|n| {
        matches!(
            n.kind,
            NodeKind::Pointer | NodeKind::CornerMarker { .. } | NodeKind::EdgeMarker { .. }
        )
    })
}

/// First non-overlay hit.
pub fn first_solid_hit(scene: &Scene, hits: &[Hit]) -> Option<Hit> {
    hits.iter().find(|h| !is_overlay(scene, h.node)).copied()
}

/// Top-level selectable object under a screen point, for touch techniques.
pub fn object_under(scene: &Scene, substrate: &dyn Substrate, screen: Vec2) -> Option<NodeId> {
    let hit = first_solid_hit(scene, &substrate.hit_test(scene, screen))?;
    let mut owner = hit.node;
    while let Some(parent) = scene.parent_of(owner) {
        owner = parent;
    }
    scene.get(owner).filter(|n| n.is_selectable()).map(|n| n.id)
}

/// Ordered selection with an optional size cap
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    members: Vec<NodeId>,
    cap: Option<usize>,
}

impl SelectionSet {
    /// `cap` of `None` allows any number of members.
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            members: Vec::new(),
            cap,
        }
    }

    /// Add a node. A no-op (returning false) when already a member, when
    /// the cap is reached, or when the node is gone.
    pub fn select(&mut self, scene: &mut Scene, id: NodeId) -> bool {
        if self.contains(id) || self.cap.is_some_and(|cap| self.members.len() >= cap) {
            return false;
        }
        if !scene.set_selected(id, true) {
            return false;
        }
        self.members.push(id);
        true
    }

    pub fn deselect(&mut self, scene: &mut Scene, id: NodeId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != id);
        scene.set_selected(id, false);
        self.members.len() != before
    }

    pub fn clear(&mut self, scene: &mut Scene) {
        for id in self.members.drain(..) {
            scene.set_selected(id, false);
        }
    }

    /// Drop members that no longer exist in the scene.
    pub fn retain_existing(&mut self, scene: &Scene) {
        self.members.retain(|id| scene.contains(*id));
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    pub fn first(&self) -> Option<NodeId> {
        self.members.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Hover tracking, selection and container navigation shared by the
/// pointer-driven techniques
#[derive(Debug, Default)]
pub struct SelectionController {
    pub selection: SelectionSet,
    hover: Option<NodeId>,
    visited: Option<NodeId>,
    /// Set when the current press added its hover target
    just_selected: bool,
}

impl SelectionController {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            selection: SelectionSet::new(cap),
            ..Self::default()
        }
    }

    pub fn hover(&self) -> Option<NodeId> {
        self.hover
    }

    pub fn visited(&self) -> Option<NodeId> {
        self.visited
    }

    /// Re-run hover from the pointer's projected position.
    pub fn update_hover(
        &mut self,
        scene: &mut Scene,
        substrate: &dyn Substrate,
        pointer: Vec3,
    ) -> Option<NodeId> {
        let screen = substrate.project(pointer).truncate();
        // Hits with no selectable owner at this level (surfaces, the visited
        // container itself) are see-through
        let target = substrate
            .hit_test(scene, screen)
            .into_iter()
            .filter(|h| !is_overlay(scene, h.node))
            .find_map(|h| self.owning_object(scene, h.node));
        self.set_hover(scene, target);
        target
    }

    fn set_hover(&mut self, scene: &mut Scene, target: Option<NodeId>) {
        if self.hover == target {
            return;
        }
        if let Some(old) = self.hover {
            scene.set_highlighted(old, false);
        }
        if let Some(new) = target {
            scene.set_highlighted(new, true);
        }
        self.hover = target;
    }

    /// The selectable object a hit belongs to at the current navigation
    /// level: the child of the visited container on the hit's ancestor
    /// chain, or the top-level ancestor when the hit lies outside it.
    fn owning_object(&self, scene: &Scene, hit: NodeId) -> Option<NodeId> {
        let mut chain = vec![hit];
        let mut current = hit;
        while let Some(parent) = scene.parent_of(current) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        let owner = match self.visited.and_then(|v| chain.iter().position(|id| *id == v)) {
            Some(0) => return None,
            Some(index) => chain[index - 1],
            None => *chain.last()?,
        };
        scene.get(owner).filter(|n| n.is_selectable()).map(|n| n.id)
    }

    /// Select-button press. Returns true if the hover target was added.
    pub fn on_press(&mut self, scene: &mut Scene) -> bool {
        self.just_selected = false;
        match self.hover {
            Some(target) => {
                if !self.selection.contains(target) && self.selection.select(scene, target) {
                    tracing::debug!("Selected {}", target);
                    self.just_selected = true;
                }
            }
            None => {
                if !self.selection.is_empty() {
                    tracing::debug!("Press on nothing, clearing {} selected", self.selection.len());
                }
                self.selection.clear(scene);
            }
        }
        self.just_selected
    }

    /// Press and release of the select button for techniques without
    /// dragging. Returns true if the press added an object.
    pub fn handle_select_button(&mut self, scene: &mut Scene, events: &ButtonEvents, button: Button) -> bool {
        let selected = events.pressed(button) && self.on_press(scene);
        if events.released(button) {
            self.on_release(scene);
        }
        selected
    }

    /// Select-button release without a drag: clicking an object that was
    /// already selected before this press deselects it.
    pub fn on_release(&mut self, scene: &mut Scene) -> bool {
        let mut changed = false;
        if let Some(target) = self.hover {
            if !self.just_selected && self.selection.contains(target) {
                changed = self.selection.deselect(scene, target);
                tracing::debug!("Deselected {}", target);
            }
        }
        self.just_selected = false;
        changed
    }

    /// Double-click: descend into a hovered child of the visited
    /// container, otherwise ascend one level.
    pub fn on_double_click(&mut self, scene: &mut Scene) {
        match self.hover {
            Some(target) if scene.parent_of(target) == self.visited => self.visit(scene, target),
            _ => self.leave(scene),
        }
    }

    fn visit(&mut self, scene: &mut Scene, target: NodeId) {
        self.selection.deselect(scene, target);
        if let Some(previous) = self.visited {
            scene.set_visited(previous, false);
        }
        scene.set_visited(target, true);
        self.visited = Some(target);
        self.set_hover(scene, None);
        tracing::debug!("Visiting {}", target);
    }

    fn leave(&mut self, scene: &mut Scene) {
        let Some(current) = self.visited.take() else {
            return;
        };
        scene.set_visited(current, false);
        self.visited = scene.parent_of(current);
        if let Some(parent) = self.visited {
            scene.set_visited(parent, true);
        }
        tracing::debug!("Left {}", current);
    }

    /// Touchscreen tap: toggle the top-level object under `screen`,
    /// replacing the selection when it is full. Tapping nothing clears it.
    /// Returns true if the tap added an object.
    pub fn tap(&mut self, scene: &mut Scene, substrate: &dyn Substrate, screen: Vec2) -> bool {
        let Some(target) = object_under(scene, substrate, screen) else {
            self.selection.clear(scene);
            return false;
        };
        if self.selection.contains(target) {
            self.selection.deselect(scene, target);
            tracing::debug!("Tap deselected {}", target);
            return false;
        }
        if !self.selection.select(scene, target) {
            self.selection.clear(scene);
            self.selection.select(scene, target);
        }
        tracing::debug!("Tap selected {}", target);
        true
    }

    /// Drop hover, selection and navigation state.
    pub fn clear(&mut self, scene: &mut Scene) {
        self.set_hover(scene, None);
        self.selection.clear(scene);
        if let Some(visited) = self.visited.take() {
            scene.set_visited(visited, false);
        }
        self.just_selected = false;
    }
}
