use crate::math::Pose;
use crate::physics::collider::{BodyKind, ColliderShape};
use glam::Vec3;

/// Opaque handle to one native collision body. Minted by the backend;
/// meaningless outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u64);

impl BodyHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Everything needed to build one native body.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: ColliderShape,
    pub mass: f32,
    pub pose: Pose,
    pub group: u16,
    pub mask: u16,
}

/// Contract over the wrapped dynamics engine.
///
/// The backend is level-triggered: after a step it reports what is touching
/// right now. Edge events are derived upstream by the physics world.
pub trait DynamicsBackend: Send {
    fn set_gravity(&mut self, gravity: Vec3);

    /// Advance the simulation by one timestep.
    fn step(&mut self, dt: f32);

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    fn remove_body(&mut self, handle: BodyHandle);

    /// Refresh broadphase filter fields in place; the body is not removed
    /// and reinserted.
    fn update_filter(&mut self, handle: BodyHandle, group: u16, mask: u16);

    /// Pairs of bodies touching after the last step. Duplicate pairs are
    /// permitted and collapse upstream.
    fn active_contacts(&self) -> Vec<(BodyHandle, BodyHandle)>;

    /// World pose of a body after the last step.
    fn body_pose(&self, handle: BodyHandle) -> Option<Pose>;

    /// Push an engine-side pose into the body's motion state.
    fn set_body_pose(&mut self, handle: BodyHandle, pose: Pose, com_offset: Pose);
}
