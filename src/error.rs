/// Error types shared by both bridges.
///
/// Every failure is fatal to the call that raised it; nothing is queued or
/// retried. Contacts that mention bodies outside the registry are not errors
/// and are skipped silently by the collision tracker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A collider record that cannot be registered, e.g. one with no scene
    /// node, or one passed to remove before it ever held an identifier.
    #[error("invalid collider: {reason}")]
    InvalidCollider { reason: &'static str },

    #[error("collider is already registered with this physics world")]
    DuplicateCollider,

    /// The bounded identifier pool ran dry.
    #[error("collider id pool exhausted ({capacity} ids in use)")]
    IdPoolExhausted { capacity: usize },

    /// A bridge component only ever serves one target.
    #[error("{component} is already attached to a target")]
    AlreadyAttached { component: &'static str },

    /// No device behind the HMD runtime. There is no degraded mode; callers
    /// get the error and decide.
    #[error("no head-mounted display available: {reason}")]
    HmdUnavailable { reason: String },

    /// Raised by the debug validation on transforms pushed into the
    /// simulation; scale and shear are not representable there.
    #[error("transform is not a rigid motion (rotation determinant {determinant})")]
    NonRigidTransform { determinant: f32 },

    #[error("settings error: {message}")]
    Settings { message: String },
}

pub type BridgeResult<T> = Result<T, BridgeError>;
