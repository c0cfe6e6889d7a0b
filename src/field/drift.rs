// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Ambient drift field: particles float through a shallow depth range,
//! projected to size/opacity. Out-of-bounds particles (including the
//! depth axis) are re-rolled from scratch, there is no wrap or clamp.

use crate::{
    config::{DeviceCaps, TickSnapshot},
    context::Context,
    error::SplashError,
    field::Field,
    render::{style::Rgba, surface::Surface},
    util::{lerp, History, PointF32, Rand},
};
use itertools::Itertools;
use log::warn;

/// Far plane of the projected depth range.
pub const DEPTH_MAX: f32 = 1000.0;
/// Minimum time between two trail samples, decoupling trail
/// resolution from frame rate.
pub const TRAIL_SAMPLE_MS: f64 = 50.0;
const BOUND_MARGIN: f32 = 24.0;

pub struct DriftParticle {
    pub pos: PointF32,
    pub z: f32,
    pub vel: PointF32,
    pub vz: f32,
    pub size: f32,
    pub alpha: f32,
    pub hue: f32,
    pub trail: History<PointF32>,
    last_sample: f64,
}

impl DriftParticle {
    pub fn new(rand: &mut Rand, w: f32, h: f32, trail_cap: usize) -> Self {
        let mut p = Self {
            pos: PointF32::default(),
            z: DEPTH_MAX,
            vel: PointF32::default(),
            vz: 0.0,
            size: 1.0,
            alpha: 0.0,
            hue: 0.0,
            trail: History::with_capacity(trail_cap),
            last_sample: 0.0,
        };
        p.reset(rand, w, h, 0.0);
        p
    }

    /// Fresh random position, velocity, depth and look; trail cleared.
    pub fn reset(&mut self, rand: &mut Rand, w: f32, h: f32, now: f64) {
        self.pos = PointF32::new(rand.gen_range_f32(0.0, w), rand.gen_range_f32(0.0, h));
        self.z = rand.gen_range_f32(DEPTH_MAX * 0.1, DEPTH_MAX);
        self.vel = PointF32::new(rand.gen_range_f32(-0.6, 0.6), rand.gen_range_f32(-0.6, 0.6));
        self.vz = rand.gen_range_f32(-3.0, -0.8);
        self.size = rand.gen_range_f32(1.0, 3.0);
        self.alpha = rand.gen_range_f32(0.35, 0.9);
        self.hue = rand.gen_range_f32(195.0, 235.0);
        self.trail.clear();
        self.last_sample = now;
    }

    pub fn out_of_bounds(&self, w: f32, h: f32) -> bool {
        self.pos.x < -BOUND_MARGIN
            || self.pos.x > w + BOUND_MARGIN
            || self.pos.y < -BOUND_MARGIN
            || self.pos.y > h + BOUND_MARGIN
            || self.z < 1.0
            || self.z > DEPTH_MAX
    }

    pub fn update(&mut self, rand: &mut Rand, w: f32, h: f32, now: f64) {
        self.pos.x += self.vel.x;
        self.pos.y += self.vel.y;
        self.z += self.vz;
        if now - self.last_sample >= TRAIL_SAMPLE_MS {
            self.trail.push(self.pos);
            self.last_sample = now;
        }
        if self.out_of_bounds(w, h) {
            self.reset(rand, w, h, now);
        }
    }

    /// Project depth to scale/opacity: near particles are larger and
    /// more opaque.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        let t = 1.0 - self.z / DEPTH_MAX;
        let scale = lerp(0.25, 1.3, t);
        let alpha = self.alpha * t.max(0.05) * snap.quality * master_alpha;
        let color = Rgba::from_hsl(self.hue, 0.7, 0.72).with_alpha(alpha);
        if snap.caps.contains(DeviceCaps::TRAILS) && self.trail.len() >= 2 {
            let n = self.trail.len() as f32;
            for (k, (a, b)) in self.trail.iter().tuple_windows().enumerate() {
                let fade = (k as f32 + 1.0) / n;
                surface.stroke_line(*a, *b, 1.0, color.scale_alpha(0.4 * fade))?;
            }
        }
        surface.fill_circle(self.pos, self.size * scale, color)
    }
}

#[derive(Default)]
pub struct DriftField {
    pub particles: Vec<DriftParticle>,
    w: f32,
    h: f32,
}

impl DriftField {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for DriftField {
    fn reset(&mut self, ctx: &mut Context, snap: &TickSnapshot, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        let now = ctx.now();
        let mut particles = Vec::with_capacity(snap.drift_count);
        for _ in 0..snap.drift_count {
            let mut p = DriftParticle::new(&mut ctx.rand, w, h, snap.trail_cap);
            p.last_sample = now;
            particles.push(p);
        }
        self.particles = particles;
    }

    fn update(&mut self, ctx: &mut Context, _snap: &TickSnapshot, now: f64) {
        for p in &mut self.particles {
            p.update(&mut ctx.rand, self.w, self.h, now);
        }
    }

    fn draw(
        &mut self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        if snap.reduced_motion {
            return Ok(());
        }
        let mut failed = 0usize;
        let mut last: Option<SplashError> = None;
        for p in &self.particles {
            if let Err(e) = p.draw(surface, snap, master_alpha) {
                failed += 1;
                last = Some(e);
            }
        }
        match last {
            Some(e) => {
                warn!("drift draw skipped {failed} particles: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn entity_count(&self) -> usize {
        self.particles.len()
    }

    fn clear(&mut self) {
        self.particles.clear();
    }

    fn trim_history(&mut self) {
        for p in &mut self.particles {
            p.trail.trim_to_cap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{snapshot, SplashConfig, Tuning};
    use crate::context::{Context, ManualClock};

    fn test_ctx() -> (Context, crate::config::TickSnapshot) {
        let cfg = SplashConfig::default();
        let snap = snapshot(&cfg, &Tuning::from_config(&cfg));
        (Context::new(Box::new(ManualClock::new())), snap)
    }

    #[test]
    fn test_forced_out_of_bounds_resets_within_surface() {
        let (mut ctx, mut snap) = test_ctx();
        snap.drift_count = 50;
        let mut field = DriftField::new();
        field.reset(&mut ctx, &snap, 800.0, 600.0);
        assert_eq!(field.entity_count(), 50);
        field.particles[0].pos = PointF32::new(4000.0, -900.0);
        field.update(&mut ctx, &snap, 16.0);
        let p = &field.particles[0];
        assert!((0.0..=800.0).contains(&p.pos.x));
        assert!((0.0..=600.0).contains(&p.pos.y));
    }

    #[test]
    fn test_trail_samples_are_time_gated() {
        let (mut ctx, snap) = test_ctx();
        let mut p = DriftParticle::new(&mut ctx.rand, 800.0, 600.0, 10);
        // park it well inside so no reset interferes
        p.pos = PointF32::new(400.0, 300.0);
        p.vel = PointF32::default();
        p.vz = 0.0;
        p.z = DEPTH_MAX * 0.5;
        let _ = snap;
        // 10 ticks within one sample window: at most one sample lands
        for i in 0..10 {
            p.update(&mut ctx.rand, 800.0, 600.0, i as f64 * 4.0);
        }
        assert!(p.trail.len() <= 1);
        // spaced ticks: one sample per window, capped by the ring
        for i in 0..50 {
            p.update(&mut ctx.rand, 800.0, 600.0, 100.0 + i as f64 * TRAIL_SAMPLE_MS);
        }
        assert!(p.trail.len() <= p.trail.cap());
        assert!(p.trail.len() >= 2);
    }

    #[test]
    fn test_reduced_motion_draws_nothing() {
        let (mut ctx, mut snap) = test_ctx();
        snap.reduced_motion = true;
        snap.drift_count = 10;
        let mut field = DriftField::new();
        field.reset(&mut ctx, &snap, 800.0, 600.0);
        let mut surface = crate::render::surface::MemorySurface::new(800, 600);
        field.draw(&mut surface, &snap, 1.0).unwrap();
        assert!(surface.ops.is_empty());
    }
}
