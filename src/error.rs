// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Failure taxonomy. Nothing here is allowed to take the host down:
//! a failed surface degrades to a detached no-draw target, invalid
//! configuration is clamped at the boundary, and a frame failure only
//! deactivates the scene it happened in.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplashError {
    /// A drawing context could not be acquired at all.
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,

    /// Rejected or clamped configuration input.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A single update/draw pass failed; the owning scene goes inactive.
    #[error("frame pass failed in scene {scene}: {reason}")]
    FrameFailed {
        scene: &'static str,
        reason: String,
    },

    /// The surface was lost mid-run. Recoverable via restoration.
    #[error("drawing surface lost")]
    SurfaceLost,
}
