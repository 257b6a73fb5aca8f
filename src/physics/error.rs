//! Physics-specific error handling
//!
//! Type alias and constructor helpers for physics bridge operations.

use crate::error::{BridgeError, BridgeResult};

/// Type alias for physics-specific results
pub type PhysicsResult<T> = BridgeResult<T>;

/// Create an invalid-collider error
pub(crate) fn invalid_collider(reason: &'static str) -> BridgeError {
    BridgeError::InvalidCollider { reason }
}

/// Create an already-attached error for the physics world
pub(crate) fn already_attached() -> BridgeError {
    BridgeError::AlreadyAttached {
        component: "PhysicsWorld",
    }
}
