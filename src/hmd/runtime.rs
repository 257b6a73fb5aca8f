/// Head-mounted display runtime contract.
///
/// Everything the stereo camera needs from a device runtime sits behind
/// `HmdRuntime`: static device facts, per-eye optics, the distortion mesh
/// and the tracked head pose. The camera never talks to device APIs
/// directly.
use glam::{Quat, Vec3};

use crate::error::BridgeResult;
use crate::hmd::distortion::DistortionMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];
}

/// Per-eye field of view as tangents of the four half-angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFov {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

/// Static facts about one display. Distances are in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmdInfo {
    pub resolution: (u32, u32),
    pub screen_size: (f32, f32),
    pub interpupillary_distance: f32,
    pub lens_separation: f32,
    pub eye_to_screen: f32,
    /// Radial distortion polynomial coefficients, constant term first.
    pub distortion_k: [f32; 4],
}

impl HmdInfo {
    /// Catalog values for the common 7-inch development kit panel. Used
    /// when the runtime cannot query the real device.
    pub fn fallback() -> Self {
        let h_screen_size = 0.14976;
        Self {
            resolution: (1280, 800),
            screen_size: (h_screen_size, h_screen_size / (1280.0 / 800.0)),
            interpupillary_distance: 0.064,
            lens_separation: 0.0635,
            eye_to_screen: 0.041,
            distortion_k: [1.0, 0.22, 0.24, 0.0],
        }
    }

    pub fn vertical_center(&self) -> f32 {
        0.5 * self.screen_size.1
    }
}

/// Sensor capabilities requested from the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingCaps {
    pub orientation: bool,
    pub mag_yaw_correction: bool,
    pub position: bool,
}

impl TrackingCaps {
    pub const ALL: Self = Self {
        orientation: true,
        mag_yaw_correction: true,
        position: true,
    };
}

/// Tracked head state relative to the tracking origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPose {
    pub orientation: Quat,
    pub position: Vec3,
}

impl Default for HeadPose {
    fn default() -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}

pub trait HmdRuntime: Send {
    fn info(&self) -> HmdInfo;

    fn default_eye_fov(&self, eye: Eye) -> EyeFov;

    /// Pixel size at which one eye should be rendered for the given field
    /// of view, before any power-of-two rounding.
    fn recommended_target_size(
        &self,
        eye: Eye,
        fov: EyeFov,
        pixels_per_display_pixel: f32,
    ) -> (u32, u32);

    fn distortion_mesh(&self, eye: Eye, fov: EyeFov) -> DistortionMesh;

    /// Start the sensors. Fails when the device is gone.
    fn configure_tracking(&mut self, caps: TrackingCaps) -> BridgeResult<()>;

    fn head_pose(&self) -> HeadPose;

    /// Make the current pose the new tracking origin.
    fn reset_tracking(&mut self);

    /// Offset from the head center to the eye, in meters.
    fn eye_offset(&self, eye: Eye) -> Vec3;
}
