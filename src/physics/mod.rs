/// Rigid-body physics bridge
///
/// Wraps an external dynamics engine behind `DynamicsBackend` and keeps the
/// scene in step with it: collider records get stable identifiers from a
/// bounded pool, a bidirectional registry ties records to native bodies, and
/// a per-frame diff of the touching-pair set turns the backend's
/// level-triggered contact list into edge-triggered collision events.

pub mod backend;
pub mod collider;
pub mod collision;
pub mod error;
pub mod id_pool;
pub mod rapier;
pub mod registry;
pub mod world;

pub use backend::{BodyDesc, BodyHandle, DynamicsBackend};
pub use collider::{BodyKind, Collider, ColliderRef, ColliderShape};
pub use collision::{CollisionEvent, CollisionPair};
pub use error::PhysicsResult;
pub use id_pool::IdPool;
pub use rapier::RapierBackend;
pub use world::PhysicsWorld;

/// Fixed ceiling on concurrently simulated bodies.
pub const MAX_SIMULATED_BODIES: usize = 2048;
