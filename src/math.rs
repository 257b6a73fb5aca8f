/// Math helpers shared by both bridges.

use crate::error::{BridgeError, BridgeResult};
use glam::{Mat3, Mat4, Quat, Vec3};

/// Allowed deviation of the 3x3 determinant from 1 before a transform is
/// rejected as non-rigid.
pub const RIGID_DETERMINANT_TOLERANCE: f32 = 1e-3;

/// Rotation plus translation, the only transform the simulation stores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self { translation, rotation }
    }

    /// Extract the rigid part of an affine matrix. Scale is dropped.
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self { translation, rotation }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Determinant of the rotation/scale block of an affine transform.
pub fn rotation_determinant(matrix: &Mat4) -> f32 {
    Mat3::from_mat4(*matrix).determinant()
}

/// A rigid motion keeps the 3x3 determinant at 1; scale or shear moves it
/// away and the simulation cannot represent either.
pub fn ensure_rigid_transform(matrix: &Mat4) -> BridgeResult<()> {
    let determinant = rotation_determinant(matrix);
    if (determinant - 1.0).abs() > RIGID_DETERMINANT_TOLERANCE {
        return Err(BridgeError::NonRigidTransform { determinant });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_pose_round_trips_through_mat4() {
        let pose = Pose::new(
            Vec3::new(1.0, -2.0, 3.5),
            Quat::from_rotation_y(FRAC_PI_4),
        );
        let recovered = Pose::from_mat4(&pose.to_mat4());

        assert!(recovered.translation.abs_diff_eq(pose.translation, 1e-5));
        assert!(recovered.rotation.abs_diff_eq(pose.rotation, 1e-5));
    }

    #[test]
    fn test_rigid_transform_accepts_rotation_translation() {
        let matrix = Mat4::from_rotation_translation(
            Quat::from_rotation_z(0.7),
            Vec3::new(4.0, 5.0, 6.0),
        );
        assert!(ensure_rigid_transform(&matrix).is_ok());
    }

    #[test]
    fn test_rigid_transform_rejects_scale() {
        let matrix = Mat4::from_scale(Vec3::splat(2.0));
        let result = ensure_rigid_transform(&matrix);
        assert!(matches!(
            result,
            Err(BridgeError::NonRigidTransform { .. })
        ));
    }

    #[test]
    fn test_from_mat4_drops_scale() {
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quat::from_rotation_x(0.3),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let pose = Pose::from_mat4(&matrix);
        assert!(ensure_rigid_transform(&pose.to_mat4()).is_ok());
    }
}
