//! HMD-specific error handling
//!
//! Type alias and constructor helpers for the stereo camera.

use crate::error::{BridgeError, BridgeResult};

/// Type alias for HMD-specific results
pub type HmdResult<T> = BridgeResult<T>;

/// Create a device-unavailable error
pub(crate) fn device_unavailable(reason: impl Into<String>) -> BridgeError {
    BridgeError::HmdUnavailable {
        reason: reason.into(),
    }
}

/// Create an already-attached error for the stereo camera
pub(crate) fn already_attached() -> BridgeError {
    BridgeError::AlreadyAttached {
        component: "HmdCamera",
    }
}
