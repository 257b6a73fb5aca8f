/// Software stand-in for a real display runtime.
///
/// Optics are derived from the device sheet in `HmdInfo`; poses are whatever
/// the embedding pushes through `set_head_pose`. Clones share one device, so
/// a test can keep a handle for driving poses while the camera owns the
/// boxed runtime.
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::error::BridgeResult;
use crate::hmd::distortion::{build_distortion_grid, DistortionMesh};
use crate::hmd::error::device_unavailable;
use crate::hmd::runtime::{Eye, EyeFov, HeadPose, HmdInfo, HmdRuntime, TrackingCaps};

/// Grid density used for generated distortion meshes.
const DISTORTION_SEGMENTS: u32 = 16;

/// Environment switch that makes `detect` behave as if no device were
/// plugged in.
pub const DISABLE_ENV_VAR: &str = "EMBER_HMD_DISABLED";

struct SimState {
    info: HmdInfo,
    tracking: TrackingCaps,
    origin: HeadPose,
    pose: HeadPose,
}

#[derive(Clone)]
pub struct SimulatedHmd {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHmd {
    pub fn new() -> Self {
        Self::with_info(HmdInfo::fallback())
    }

    pub fn with_info(info: HmdInfo) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                info,
                tracking: TrackingCaps::default(),
                origin: HeadPose::default(),
                pose: HeadPose::default(),
            })),
        }
    }

    /// Probe for the simulated device. Mirrors runtime detection of real
    /// hardware, including its failure mode.
    pub fn detect() -> BridgeResult<Self> {
        if std::env::var_os(DISABLE_ENV_VAR).is_some() {
            return Err(device_unavailable("no head-mounted display detected"));
        }
        Ok(Self::new())
    }

    /// Feed the pose the sensors should report next.
    pub fn set_head_pose(&self, pose: HeadPose) {
        self.state.lock().pose = pose;
    }
}

impl Default for SimulatedHmd {
    fn default() -> Self {
        Self::new()
    }
}

impl HmdRuntime for SimulatedHmd {
    fn info(&self) -> HmdInfo {
        self.state.lock().info
    }

    fn default_eye_fov(&self, _eye: Eye) -> EyeFov {
        let state = self.state.lock();
        let horizontal = 0.25 * state.info.screen_size.0 / state.info.eye_to_screen;
        let vertical = state.info.vertical_center() / state.info.eye_to_screen;
        EyeFov {
            up_tan: vertical,
            down_tan: vertical,
            left_tan: horizontal,
            right_tan: horizontal,
        }
    }

    fn recommended_target_size(
        &self,
        eye: Eye,
        fov: EyeFov,
        pixels_per_display_pixel: f32,
    ) -> (u32, u32) {
        let default_fov = self.default_eye_fov(eye);
        let state = self.state.lock();
        let base_width = state.info.resolution.0 as f32 / 2.0;
        let base_height = state.info.resolution.1 as f32;

        let width = base_width * (fov.left_tan + fov.right_tan)
            / (default_fov.left_tan + default_fov.right_tan);
        let height =
            base_height * (fov.up_tan + fov.down_tan) / (default_fov.up_tan + default_fov.down_tan);

        (
            (width * pixels_per_display_pixel).ceil() as u32,
            (height * pixels_per_display_pixel).ceil() as u32,
        )
    }

    fn distortion_mesh(&self, _eye: Eye, fov: EyeFov) -> DistortionMesh {
        let k = self.state.lock().info.distortion_k;
        build_distortion_grid(fov, k, DISTORTION_SEGMENTS)
    }

    fn configure_tracking(&mut self, caps: TrackingCaps) -> BridgeResult<()> {
        self.state.lock().tracking = caps;
        Ok(())
    }

    fn head_pose(&self) -> HeadPose {
        let state = self.state.lock();
        let mut pose = HeadPose::default();
        if state.tracking.orientation {
            pose.orientation = state.origin.orientation.inverse() * state.pose.orientation;
        }
        if state.tracking.position {
            pose.position = state.pose.position - state.origin.position;
        }
        pose
    }

    fn reset_tracking(&mut self) {
        let mut state = self.state.lock();
        state.origin = state.pose;
    }

    fn eye_offset(&self, eye: Eye) -> Vec3 {
        let half_ipd = 0.5 * self.state.lock().info.interpupillary_distance;
        match eye {
            Eye::Left => Vec3::new(-half_ipd, 0.0, 0.0),
            Eye::Right => Vec3::new(half_ipd, 0.0, 0.0),
        }
    }
}
