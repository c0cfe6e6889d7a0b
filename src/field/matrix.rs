// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Falling-glyph matrix effect. Each column keeps one head position
//! and a bounded glyph queue; glyphs age individually and drop out on
//! their own schedule rather than as a fixed-length FIFO.

use crate::{
    config::TickSnapshot,
    context::Context,
    error::SplashError,
    field::Field,
    render::{style::Rgba, surface::Surface},
    util::{History, PointF32, Rand},
};
use log::warn;

/// Randomized delay window between two glyph appends, in ms.
pub const GLYPH_DELAY_MIN_MS: f64 = 100.0;
pub const GLYPH_DELAY_MAX_MS: f64 = 300.0;
/// A glyph is removed once it has aged past this many ticks.
pub const GLYPH_LIFE_TICKS: u32 = 110;
/// Vertical pitch between glyphs of one column, px.
pub const GLYPH_STEP: f32 = 16.0;
const COLUMN_SLACK: f32 = 64.0;

const CHARSET: &str =
    "アイウエオカキクケコサシスセソタチツテトナニヌネノ0123456789ABCDEFXYZ$+-*/=<>";

#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    pub ch: char,
    pub age: u32,
}

pub struct FallingColumn {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub glyphs: History<Glyph>,
    next_glyph_at: f64,
}

impl FallingColumn {
    pub fn new(rand: &mut Rand, x: f32, h: f32, glyph_cap: usize) -> Self {
        Self {
            x,
            y: -rand.gen_range_f32(0.0, h),
            speed: rand.gen_range_f32(2.0, 6.0),
            glyphs: History::with_capacity(glyph_cap),
            next_glyph_at: 0.0,
        }
    }

    pub fn update(&mut self, rand: &mut Rand, charset: &[char], h: f32, now: f64) {
        self.y += self.speed;
        if self.y > h + COLUMN_SLACK {
            // restart above the surface with a fresh pace
            self.y = -rand.gen_range_f32(0.0, h * 0.5);
            self.speed = rand.gen_range_f32(2.0, 6.0);
        }
        for g in self.glyphs.iter_mut() {
            g.age += 1;
            // the occasional mid-life mutation keeps the rain shimmering
            if rand.chance(0.02) {
                if let Some(&ch) = rand.pick(charset) {
                    g.ch = ch;
                }
            }
        }
        self.glyphs.retain(|g| g.age <= GLYPH_LIFE_TICKS);
        if now >= self.next_glyph_at && self.glyphs.len() < self.glyphs.cap() {
            if let Some(&ch) = rand.pick(charset) {
                self.glyphs.push(Glyph { ch, age: 0 });
            }
            self.next_glyph_at = now + rand.gen_range(GLYPH_DELAY_MIN_MS, GLYPH_DELAY_MAX_MS);
        }
    }

    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        h: f32,
        quality: f32,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        // newest glyph rides the head, older ones trail above it
        for (k, g) in self.glyphs.iter().rev().enumerate() {
            let gy = self.y - k as f32 * GLYPH_STEP;
            if gy < -GLYPH_STEP || gy > h + GLYPH_STEP {
                continue;
            }
            let life = 1.0 - g.age as f32 / GLYPH_LIFE_TICKS as f32;
            let alpha = life * quality * master_alpha;
            let color = if k == 0 {
                // lead glyph is brighter than the tail
                Rgba::from_hsl(130.0, 0.9, 0.85).with_alpha(alpha)
            } else {
                Rgba::from_hsl(130.0, 0.85, 0.45).with_alpha(alpha * 0.8)
            };
            surface.fill_text(g.ch, PointF32::new(self.x, gy), GLYPH_STEP, color)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MatrixField {
    pub columns: Vec<FallingColumn>,
    charset: Vec<char>,
    w: f32,
    h: f32,
}

impl MatrixField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for MatrixField {
    fn reset(&mut self, ctx: &mut Context, snap: &TickSnapshot, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        self.charset = CHARSET.chars().collect();
        ctx.rand.shuffle(&mut self.charset);
        let fit = (w / GLYPH_STEP).floor() as usize;
        let n = snap.column_count.min(fit.max(1));
        let spacing = w / n.max(1) as f32;
        self.columns = (0..n)
            .map(|i| {
                FallingColumn::new(&mut ctx.rand, (i as f32 + 0.5) * spacing, h, snap.glyph_cap)
            })
            .collect();
    }

    fn update(&mut self, ctx: &mut Context, _snap: &TickSnapshot, now: f64) {
        for col in &mut self.columns {
            col.update(&mut ctx.rand, &self.charset, self.h, now);
        }
    }

    fn draw(
        &mut self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        let mut failed = 0usize;
        let mut last: Option<SplashError> = None;
        for col in &self.columns {
            if let Err(e) = col.draw(surface, self.h, snap.quality, master_alpha) {
                failed += 1;
                last = Some(e);
            }
        }
        match last {
            Some(e) => {
                warn!("matrix draw skipped {failed} columns: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn entity_count(&self) -> usize {
        self.columns.len()
    }

    fn clear(&mut self) {
        self.columns.clear();
    }

    fn trim_history(&mut self) {
        for col in &mut self.columns {
            col.glyphs.trim_to_cap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{snapshot, SplashConfig, Tuning};
    use crate::context::{Context, ManualClock};

    fn test_parts() -> (Context, crate::config::TickSnapshot) {
        let cfg = SplashConfig::default();
        let snap = snapshot(&cfg, &Tuning::from_config(&cfg));
        (Context::new(Box::new(ManualClock::new())), snap)
    }

    #[test]
    fn test_glyph_queue_respects_cap_and_delay() {
        let (mut ctx, snap) = test_parts();
        let mut field = MatrixField::new();
        field.reset(&mut ctx, &snap, 640.0, 480.0);
        let mut now = 0.0;
        for _ in 0..2000 {
            field.update(&mut ctx, &snap, now);
            now += 16.0;
            for col in &field.columns {
                assert!(col.glyphs.len() <= snap.glyph_cap);
            }
        }
        // something actually rained
        assert!(field.columns.iter().any(|c| !c.glyphs.is_empty()));
    }

    #[test]
    fn test_glyphs_age_out_individually() {
        let (mut ctx, _snap) = test_parts();
        let charset: Vec<char> = "AB".chars().collect();
        let mut col = FallingColumn::new(&mut ctx.rand, 10.0, 480.0, 8);
        col.update(&mut ctx.rand, &charset, 480.0, 0.0);
        assert_eq!(col.glyphs.len(), 1);
        // no appends while the delay holds, glyph keeps aging
        for t in 0..=GLYPH_LIFE_TICKS {
            col.next_glyph_at = f64::MAX;
            col.update(&mut ctx.rand, &charset, 480.0, t as f64);
        }
        assert!(col.glyphs.is_empty(), "aged glyph was not removed");
    }

    #[test]
    fn test_column_resets_above_surface() {
        let (mut ctx, _snap) = test_parts();
        let charset: Vec<char> = "X".chars().collect();
        let mut col = FallingColumn::new(&mut ctx.rand, 10.0, 100.0, 4);
        col.y = 100.0 + COLUMN_SLACK + 1.0;
        col.update(&mut ctx.rand, &charset, 100.0, 0.0);
        assert!(col.y <= 0.0, "column should restart above the top");
    }

    #[test]
    fn test_column_count_follows_snapshot_budget() {
        let (mut ctx, mut snap) = test_parts();
        snap.column_count = 12;
        let mut field = MatrixField::new();
        field.reset(&mut ctx, &snap, 1024.0, 768.0);
        assert_eq!(field.entity_count(), 12);
        // narrow surface caps the fit
        field.reset(&mut ctx, &snap, 64.0, 768.0);
        assert!(field.entity_count() <= 4);
    }
}
