/// rapier3d adapter behind the DynamicsBackend seam.
///
/// All nalgebra types stay inside this file; the rest of the crate talks
/// glam and Pose. Handles handed out here are plain counters mapped to
/// rapier handles in both directions so the adapter can resolve contact
/// pairs back to its own currency.
use rapier3d::na;
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;

use crate::math::Pose;
use crate::physics::backend::{BodyDesc, BodyHandle, DynamicsBackend};
use crate::physics::collider::{BodyKind, ColliderShape};

pub struct RapierBackend {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    next_raw_handle: u64,
    rapier_of: FxHashMap<BodyHandle, RigidBodyHandle>,
    handle_of: FxHashMap<RigidBodyHandle, BodyHandle>,
}

impl RapierBackend {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            next_raw_handle: 0,
            rapier_of: FxHashMap::default(),
            handle_of: FxHashMap::default(),
        }
    }

    fn to_isometry(pose: Pose) -> Isometry<Real> {
        let t = na::Translation3::new(pose.translation.x, pose.translation.y, pose.translation.z);
        let q = na::Unit::new_normalize(na::Quaternion::new(
            pose.rotation.w,
            pose.rotation.x,
            pose.rotation.y,
            pose.rotation.z,
        ));
        Isometry::from_parts(t, q)
    }

    fn from_isometry(iso: &Isometry<Real>) -> Pose {
        let t = iso.translation.vector;
        let q = iso.rotation.quaternion();
        Pose {
            translation: glam::Vec3::new(t.x, t.y, t.z),
            rotation: glam::Quat::from_xyzw(q.i, q.j, q.k, q.w),
        }
    }

    fn build_shape(shape: &ColliderShape) -> SharedShape {
        match shape {
            ColliderShape::Box { half_extents } => {
                SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ColliderShape::Sphere { radius } => SharedShape::ball(*radius),
            ColliderShape::Capsule {
                half_height,
                radius,
            } => SharedShape::capsule_y(*half_height, *radius),
            ColliderShape::Cylinder {
                half_height,
                radius,
            } => SharedShape::cylinder(*half_height, *radius),
        }
    }

    fn interaction_groups(group: u16, mask: u16) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(group as u32),
            Group::from_bits_truncate(mask as u32),
        )
    }
}

impl Default for RapierBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicsBackend for RapierBackend {
    fn set_gravity(&mut self, gravity: glam::Vec3) {
        self.gravity = vector![gravity.x, gravity.y, gravity.z];
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let body_type = match desc.kind {
            BodyKind::Fixed => RigidBodyType::Fixed,
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        };

        let rigid_body = RigidBodyBuilder::new(body_type)
            .position(Self::to_isometry(desc.pose))
            .build();
        let rb_handle = self.bodies.insert(rigid_body);

        let mut collider = ColliderBuilder::new(Self::build_shape(&desc.shape))
            .collision_groups(Self::interaction_groups(desc.group, desc.mask));
        if desc.kind == BodyKind::Dynamic {
            collider = collider.mass(desc.mass);
        }
        self.colliders
            .insert_with_parent(collider.build(), rb_handle, &mut self.bodies);

        let handle = BodyHandle::from_raw(self.next_raw_handle);
        self.next_raw_handle += 1;
        self.rapier_of.insert(handle, rb_handle);
        self.handle_of.insert(rb_handle, handle);
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(rb_handle) = self.rapier_of.remove(&handle) {
            self.handle_of.remove(&rb_handle);
            self.bodies.remove(
                rb_handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    fn update_filter(&mut self, handle: BodyHandle, group: u16, mask: u16) {
        let Some(&rb_handle) = self.rapier_of.get(&handle) else {
            return;
        };
        let Some(body) = self.bodies.get(rb_handle) else {
            return;
        };
        let groups = Self::interaction_groups(group, mask);
        for collider_handle in body.colliders().to_vec() {
            if let Some(collider) = self.colliders.get_mut(collider_handle) {
                collider.set_collision_groups(groups);
            }
        }
    }

    fn active_contacts(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let mut contacts = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let first = self
                .colliders
                .get(pair.collider1)
                .and_then(|c| c.parent())
                .and_then(|rb| self.handle_of.get(&rb));
            let second = self
                .colliders
                .get(pair.collider2)
                .and_then(|c| c.parent())
                .and_then(|rb| self.handle_of.get(&rb));
            if let (Some(&a), Some(&b)) = (first, second) {
                contacts.push((a, b));
            }
        }
        contacts
    }

    fn body_pose(&self, handle: BodyHandle) -> Option<Pose> {
        let rb_handle = self.rapier_of.get(&handle)?;
        let body = self.bodies.get(*rb_handle)?;
        Some(Self::from_isometry(body.position()))
    }

    fn set_body_pose(&mut self, handle: BodyHandle, pose: Pose, com_offset: Pose) {
        let Some(&rb_handle) = self.rapier_of.get(&handle) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(rb_handle) else {
            return;
        };
        let iso = Self::to_isometry(pose) * Self::to_isometry(com_offset);
        if body.is_kinematic() {
            body.set_next_kinematic_position(iso);
        } else {
            body.set_position(iso, true);
        }
    }
}
