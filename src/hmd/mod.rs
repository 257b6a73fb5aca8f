/// Head-mounted display bridge
///
/// Wraps a VR runtime behind `HmdRuntime` and drives the host's stereo
/// rendering from it: a shared render target split into per-eye viewports,
/// per-eye cameras and distortion meshes, and head tracking written back to
/// the scene every frame. `SimulatedHmd` stands in for real hardware.

pub mod camera;
pub mod distortion;
pub mod error;
pub mod runtime;
pub mod simulated;

pub use camera::{EyeRig, HmdCamera};
pub use distortion::{build_distortion_grid, distort_radius, DistortionMesh, DistortionVertex};
pub use error::HmdResult;
pub use runtime::{Eye, EyeFov, HeadPose, HmdInfo, HmdRuntime, TrackingCaps};
pub use simulated::SimulatedHmd;

/// Scale from tracking units (meters) to scene units.
pub const WORLD_UNIT: f32 = 1.0;
