//! Shared fixtures for engine tests

use arpen_core::{BoundingBox, Button, ButtonState, NodeId, NodeKind, Scene, SceneNode, Transform};
use arpen_view::{SoftwareViewport, ViewportConfig};
use glam::Vec3;

use crate::frame::FrameInput;

/// Orthographic camera at z = 1 looking down -Z, centered on y = 0.2.
/// One world unit is 1000 pixels, so screen and world map linearly.
pub fn ortho_viewport() -> SoftwareViewport {
    let mut config = ViewportConfig::orthographic(0.5, 1000.0);
    config.camera_position = Vec3::new(0.0, 0.2, 1.0);
    SoftwareViewport::new(&config)
}

/// Scene with one 0.1 x 0.05 x 0.08 box centered at (0, 0.2, 0)
pub fn scene_with_box() -> (Scene, NodeId) {
    let mut scene = Scene::new("test");
    let id = scene.insert(SceneNode::object(
        "box",
        Vec3::new(0.0, 0.2, 0.0),
        Vec3::new(0.05, 0.025, 0.04),
    ));
    (scene, id)
}

/// Large backdrop plane behind everything at z = -0.5
pub fn add_backdrop(scene: &mut Scene) -> NodeId {
    scene.insert(
        SceneNode::new("wall", NodeKind::Surface)
            .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, -0.5)))
            .with_bounds(BoundingBox::from_center_half_extents(
                Vec3::ZERO,
                Vec3::new(5.0, 5.0, 0.001),
            )),
    )
}

pub fn frame(time: f32, pointer: Vec3, held: &[Button]) -> FrameInput {
    FrameInput::new(time, pointer).with_buttons(ButtonState::held(held))
}

/// Scene, substrate and plumbing for driving one technique directly
pub struct Harness {
    pub scene: Scene,
    pub viewport: SoftwareViewport,
    pub bake: crate::bake::BakeWorker,
    pub missing: crate::lookup::MissingNodeLog,
    pub sampler: crate::input::ButtonSampler,
    pub time: f32,
}

impl Harness {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            viewport: ortho_viewport(),
            bake: crate::bake::BakeWorker::new(),
            missing: crate::lookup::MissingNodeLog::new(),
            sampler: crate::input::ButtonSampler::default(),
            time: 0.0,
        }
    }

    pub fn ctx(&mut self) -> crate::technique::FrameContext<'_> {
        crate::technique::FrameContext {
            scene: &mut self.scene,
            substrate: &self.viewport,
            bake: &self.bake,
            missing: &mut self.missing,
            time: self.time,
        }
    }

    pub fn step(&mut self, technique: &mut dyn crate::technique::ManipulationTechnique, input: FrameInput) {
        self.time = input.time;
        let events = self.sampler.update(input.buttons, input.time);
        let mut ctx = self.ctx();
        technique.update(&mut ctx, &input, &events);
    }

    pub fn touch(&mut self, technique: &mut dyn crate::technique::ManipulationTechnique, event: crate::frame::TouchEvent) {
        let mut ctx = self.ctx();
        technique.touch(&mut ctx, &event);
    }

    pub fn transform(&self, id: NodeId) -> Transform {
        self.scene.transform(id).unwrap_or_default()
    }
}
