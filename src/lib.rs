pub mod error;
pub mod frame;
pub mod hmd;
pub mod math;
pub mod physics;
pub mod render;
pub mod scene;
pub mod settings;
pub mod signal;

pub use error::{BridgeError, BridgeResult};
pub use frame::{FrameLoop, FrameTick};
pub use hmd::{Eye, HeadPose, HmdCamera, HmdInfo, HmdRuntime, SimulatedHmd};
pub use math::Pose;
pub use physics::{
    BodyKind, Collider, ColliderRef, ColliderShape, CollisionEvent, DynamicsBackend, PhysicsWorld,
    RapierBackend,
};
pub use scene::{Node, NodeRef};
pub use settings::{BridgeSettings, HmdSettings, PhysicsSettings};
pub use signal::{Signal, Slot};
