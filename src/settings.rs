/// Bridge configuration
///
/// TOML-loadable settings for both bridges. Every key has a default, so a
/// partial file (or none at all) is enough to get going.

use crate::error::{BridgeError, BridgeResult};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Timestep handed to the simulation each frame.
    pub fixed_timestep: f32,
    pub gravity: [f32; 3],
}

impl PhysicsSettings {
    pub fn gravity_vec3(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            gravity: [0.0, -9.81, 0.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HmdSettings {
    /// Render-target density relative to the panel, 1.0 = native.
    pub pixels_per_display_pixel: f32,
    /// Upper bound on either edge of the shared eye target.
    pub max_target_size: u32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for HmdSettings {
    fn default() -> Self {
        Self {
            pixels_per_display_pixel: 1.0,
            max_target_size: 2048,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub physics: PhysicsSettings,
    pub hmd: HmdSettings,
}

impl BridgeSettings {
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| BridgeError::Settings {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> BridgeResult<Self> {
        toml::from_str(text).map_err(|e| BridgeError::Settings {
            message: e.to_string(),
        })
    }
}
