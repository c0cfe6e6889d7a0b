// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Entity families. Each field owns one homogeneous entity collection
//! and implements the same update/draw cycle; family-specific state
//! (trail history, neighbor query, glyph queue) lives in the family,
//! not on a shared base.
//!
//! drift: ambient 3d-style particles with depth projection and trails.
//! linked: pointer-reactive particles joined by proximity lines.
//! matrix: falling glyph columns with per-glyph aging.

use crate::{
    config::TickSnapshot, context::Context, error::SplashError, render::surface::Surface,
};

pub mod drift;
pub mod linked;
pub mod matrix;

pub use drift::DriftField;
pub use linked::LinkedField;
pub use matrix::MatrixField;

pub trait Field {
    /// Discard and recreate the entity collection for the given
    /// surface bounds. Count changes always come through here; a
    /// collection is never resized in place.
    fn reset(&mut self, ctx: &mut Context, snap: &TickSnapshot, w: f32, h: f32);

    /// Advance every entity one tick, then refresh whatever derived
    /// structure the family keeps (neighbor index).
    fn update(&mut self, ctx: &mut Context, snap: &TickSnapshot, now: f64);

    /// Draw every entity. A failing entity is skipped and counted, the
    /// rest of the batch still draws; an error return means the pass
    /// as a whole failed and the owning scene should go inactive.
    fn draw(
        &mut self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError>;

    fn entity_count(&self) -> usize;

    /// Drop all entities (scene teardown).
    fn clear(&mut self);

    /// Defensive buffer sweep driven by the lifecycle manager.
    fn trim_history(&mut self);
}
