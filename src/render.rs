// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Render module: the Surface abstraction over the host drawing
//! target, color/style helpers, and the Scene that drives one entity
//! family's update/draw cycle.
//!
//! surface: drawing target trait, host-provided (plus a memory capture
//! target and a detached no-draw target for degraded mode).
//! style: premultiplied-free RGBA color with HSL construction.
//! scene: per-scene frame loop state, gating and failure isolation.

pub mod scene;
pub mod style;
pub mod surface;
