// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! PixelSplash is a 2d splash-scene engine driving three concurrently
//! animated particle scenes over a host-provided drawing surface: an
//! introductory drift field with depth projection and motion trails,
//! an interactive hero field with pointer repulsion and proximity
//! connections, and a falling-glyph matrix effect.
//!
//! The engine is deliberately host-agnostic: the drawing surface, the
//! clock and the normalized input all arrive through trait
//! collaborators, so the same core runs under a native loop, a
//! browser-style redraw callback or a headless test harness.
//!
//! Everything runs on one cooperative thread. A frame scheduler gates
//! each scene to its target rate and continuously adapts a quality
//! scalar (and the live entity budget) to observed throughput, and a
//! lifecycle manager pauses, reclaims and restores scenes as the host
//! backgrounds, resizes or loses its surface.

/// Frame units per second for the timer center.
pub const SPLASH_FRAME: u32 = 60;

/// splash configuration, device capabilities and the shared tuning
/// state mutated by the adaptive quality loop
pub mod config;

/// shared collaborators: monotonic clock, RNG, pointer state
pub mod context;

/// failure taxonomy; every failure degrades instead of raising
pub mod error;

/// processing host signals, global event center and frame timers
pub mod event;

/// entity families: drift particles, linked particles, glyph columns
pub mod field;

/// integrates the three scenes, sequences intro to main handoff,
/// encapsulates the main loop
pub mod game;

/// uniform-grid neighborhood index and its linear-scan fallback
pub mod index;

/// pause/resume on visibility, periodic reclamation, surface recovery
pub mod lifecycle;

/// log
pub mod log;

/// Render module: surface abstraction, color style, scene frame loop.
/// The engine draws through the Surface trait only; hosts decide what
/// actually rasterizes (canvas, GPU quad list, nothing at all).
pub mod render;

/// frame gating and the adaptive quality loop
pub mod sched;

/// common tools and data structures: points, RNG, bounded history
pub mod util;
