use crate::math::Pose;
use crate::physics::collision::CollisionEvent;
use crate::scene::NodeRef;
use crate::signal::Signal;
use glam::{Mat4, Vec3};
use parking_lot::Mutex;
use std::sync::Arc;

pub const DEFAULT_COLLISION_GROUP: u16 = 1;
pub const DEFAULT_COLLISION_MASK: u16 = u16::MAX;

/// Collision shape in the record's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
}

/// How the body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Fixed,
    Dynamic,
    /// Driven from the scene side through the motion-state push.
    Kinematic,
}

impl BodyKind {
    /// Static bodies never get their transform read back from the
    /// simulation; that covers fixed and kinematic bodies alike.
    pub fn is_static(&self) -> bool {
        !matches!(self, BodyKind::Dynamic)
    }
}

pub type ColliderRef = Arc<Collider>;

struct ColliderState {
    id: Option<u32>,
    node: Option<NodeRef>,
    group: u16,
    mask: u16,
    trigger_collisions: bool,
    world_transform: Mat4,
}

/// Engine-side record of one physics-enabled entity.
///
/// Shape, kind and mass are fixed at construction; filters, the trigger flag
/// and the scene association can change afterwards. The world listens on
/// `filter_changed` to refresh broadphase filters in place.
pub struct Collider {
    kind: BodyKind,
    shape: ColliderShape,
    mass: f32,
    state: Mutex<ColliderState>,
    /// Fired when the broadphase group or mask changes.
    pub filter_changed: Signal<()>,
    /// Fired when simulation results move this record.
    pub transform_changed: Signal<()>,
    pub collision_started: Signal<CollisionEvent>,
    pub collision_ended: Signal<CollisionEvent>,
}

impl Collider {
    pub fn new(kind: BodyKind, shape: ColliderShape, mass: f32) -> ColliderRef {
        debug_assert!(
            kind != BodyKind::Dynamic || mass > 0.0,
            "dynamic collider requires positive mass"
        );
        Arc::new(Self {
            kind,
            shape,
            mass,
            state: Mutex::new(ColliderState {
                id: None,
                node: None,
                group: DEFAULT_COLLISION_GROUP,
                mask: DEFAULT_COLLISION_MASK,
                trigger_collisions: false,
                world_transform: Mat4::IDENTITY,
            }),
            filter_changed: Signal::new(),
            transform_changed: Signal::new(),
            collision_started: Signal::new(),
            collision_ended: Signal::new(),
        })
    }

    pub fn dynamic(shape: ColliderShape, mass: f32) -> ColliderRef {
        Self::new(BodyKind::Dynamic, shape, mass)
    }

    pub fn fixed(shape: ColliderShape) -> ColliderRef {
        Self::new(BodyKind::Fixed, shape, 0.0)
    }

    pub fn kinematic(shape: ColliderShape) -> ColliderRef {
        Self::new(BodyKind::Kinematic, shape, 0.0)
    }

    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Identifier assigned while the record is registered with a world.
    pub fn id(&self) -> Option<u32> {
        self.state.lock().id
    }

    pub(crate) fn assign_id(&self, id: u32) {
        self.state.lock().id = Some(id);
    }

    pub(crate) fn clear_id(&self) {
        self.state.lock().id = None;
    }

    pub fn node(&self) -> Option<NodeRef> {
        self.state.lock().node.clone()
    }

    /// Associate the record with its scene entity. The node's current
    /// transform becomes the record's starting world transform.
    pub fn set_node(&self, node: &NodeRef) {
        let mut state = self.state.lock();
        state.world_transform = node.transform();
        state.node = Some(node.clone());
    }

    pub fn group(&self) -> u16 {
        self.state.lock().group
    }

    pub fn mask(&self) -> u16 {
        self.state.lock().mask
    }

    pub fn set_filter(&self, group: u16, mask: u16) {
        {
            let mut state = self.state.lock();
            state.group = group;
            state.mask = mask;
        }
        self.filter_changed.emit(&());
    }

    pub fn trigger_collisions(&self) -> bool {
        self.state.lock().trigger_collisions
    }

    /// Opt this record into collision-started notifications.
    pub fn set_trigger_collisions(&self, enabled: bool) {
        self.state.lock().trigger_collisions = enabled;
    }

    pub fn world_transform(&self) -> Mat4 {
        self.state.lock().world_transform
    }

    /// Write a simulation result back into the record and its node.
    pub(crate) fn apply_simulation_pose(&self, pose: Pose) {
        let matrix = pose.to_mat4();
        let node = {
            let mut state = self.state.lock();
            state.world_transform = matrix;
            state.node.clone()
        };
        if let Some(node) = node {
            node.set_transform(matrix);
        }
        self.transform_changed.emit(&());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use glam::Quat;

    #[test]
    fn test_defaults_match_an_unfiltered_record() {
        let collider = Collider::dynamic(ColliderShape::Sphere { radius: 0.5 }, 1.0);
        assert_eq!(collider.group(), DEFAULT_COLLISION_GROUP);
        assert_eq!(collider.mask(), DEFAULT_COLLISION_MASK);
        assert!(!collider.trigger_collisions());
        assert!(collider.id().is_none());
        assert!(collider.node().is_none());
    }

    #[test]
    fn test_static_kinds() {
        assert!(BodyKind::Fixed.is_static());
        assert!(BodyKind::Kinematic.is_static());
        assert!(!BodyKind::Dynamic.is_static());
    }

    #[test]
    fn test_set_filter_fires_change_signal() {
        let collider = Collider::fixed(ColliderShape::Box {
            half_extents: Vec3::ONE,
        });
        let fired = Arc::new(Mutex::new(0));

        let sink = fired.clone();
        let _slot = collider.filter_changed.connect(move |_| *sink.lock() += 1);

        collider.set_filter(0b10, 0b11);
        assert_eq!(*fired.lock(), 1);
        assert_eq!(collider.group(), 0b10);
        assert_eq!(collider.mask(), 0b11);
    }

    #[test]
    fn test_set_node_captures_the_node_transform() {
        let node = Node::with_transform("crate", Mat4::from_translation(Vec3::Y * 3.0));
        let collider = Collider::dynamic(ColliderShape::Sphere { radius: 0.5 }, 1.0);

        collider.set_node(&node);
        assert_eq!(collider.world_transform(), Mat4::from_translation(Vec3::Y * 3.0));
    }

    #[test]
    fn test_apply_simulation_pose_updates_node_and_signals() {
        let node = Node::new("ball");
        let collider = Collider::dynamic(ColliderShape::Sphere { radius: 0.5 }, 1.0);
        collider.set_node(&node);

        let fired = Arc::new(Mutex::new(0));
        let sink = fired.clone();
        let _slot = collider.transform_changed.connect(move |_| *sink.lock() += 1);

        let pose = Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        collider.apply_simulation_pose(pose);

        assert_eq!(*fired.lock(), 1);
        assert_eq!(node.transform(), pose.to_mat4());
        assert_eq!(collider.world_transform(), pose.to_mat4());
    }
}
