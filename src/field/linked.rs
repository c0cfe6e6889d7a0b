// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

//! Interactive hero field: slow-drifting particles anchored to a home
//! position, pushed away from the pointer and joined by proximity
//! lines. The connection search goes through a NeighborQuery strategy
//! picked once at reset, never re-chosen in the hot loop.

use crate::{
    config::{DeviceCaps, TickSnapshot},
    context::Context,
    error::SplashError,
    field::Field,
    index::{make_query, LinearScan, NeighborQuery},
    render::{style::Rgba, surface::Surface},
    util::{PointF32, Rand},
};
use log::warn;

/// Per-tick easing toward the home anchor. Keeps the field from
/// drifting away permanently.
pub const HOME_EASE: f32 = 0.005;
/// Per-tick decay of the pointer-induced velocity outside influence.
pub const PUSH_DECAY: f32 = 0.95;
const PUSH_STRENGTH: f32 = 3.0;
const WRAP_MARGIN: f32 = 16.0;

pub struct LinkedParticle {
    pub pos: PointF32,
    pub home: PointF32,
    pub vel: PointF32,
    /// Velocity injected by pointer repulsion, decays back to zero.
    pub push: PointF32,
    pub size: f32,
    pub hue: f32,
}

impl LinkedParticle {
    pub fn new(rand: &mut Rand, w: f32, h: f32) -> Self {
        let home = PointF32::new(rand.gen_range_f32(0.0, w), rand.gen_range_f32(0.0, h));
        Self {
            pos: home,
            home,
            vel: PointF32::new(rand.gen_range_f32(-0.25, 0.25), rand.gen_range_f32(-0.25, 0.25)),
            push: PointF32::default(),
            size: rand.gen_range_f32(1.5, 3.0),
            hue: rand.gen_range_f32(205.0, 275.0),
        }
    }

    pub fn update(&mut self, pointer: Option<PointF32>, influence: f32, w: f32, h: f32) {
        self.pos.x += self.vel.x;
        self.pos.y += self.vel.y;

        let mut pushed = false;
        if influence > 0.0 {
            if let Some(p) = pointer {
                let d2 = self.pos.dist_sq(&p);
                let inf2 = influence * influence;
                if d2 < inf2 && d2 > 1e-3 {
                    // repulsion falls off linearly in squared distance
                    let f = (inf2 - d2) / inf2;
                    let d = d2.sqrt();
                    self.push.x = (self.pos.x - p.x) / d * f * PUSH_STRENGTH;
                    self.push.y = (self.pos.y - p.y) / d * f * PUSH_STRENGTH;
                    pushed = true;
                }
            }
        }
        if !pushed {
            self.push.x *= PUSH_DECAY;
            self.push.y *= PUSH_DECAY;
        }
        self.pos.x += self.push.x;
        self.pos.y += self.push.y;

        self.pos.x += (self.home.x - self.pos.x) * HOME_EASE;
        self.pos.y += (self.home.y - self.pos.y) * HOME_EASE;

        // toroidal wrap with a small margin
        let span_x = w + 2.0 * WRAP_MARGIN;
        let span_y = h + 2.0 * WRAP_MARGIN;
        if self.pos.x < -WRAP_MARGIN {
            self.pos.x += span_x;
        } else if self.pos.x > w + WRAP_MARGIN {
            self.pos.x -= span_x;
        }
        if self.pos.y < -WRAP_MARGIN {
            self.pos.y += span_y;
        } else if self.pos.y > h + WRAP_MARGIN {
            self.pos.y -= span_y;
        }
    }
}

pub struct LinkedField {
    pub particles: Vec<LinkedParticle>,
    query: Box<dyn NeighborQuery>,
    positions: Vec<PointF32>,
    scratch: Vec<usize>,
    w: f32,
    h: f32,
}

impl Default for LinkedField {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedField {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            query: Box::new(LinearScan::new()),
            positions: Vec::new(),
            scratch: Vec::new(),
            w: 0.0,
            h: 0.0,
        }
    }

    /// Candidate indices near particle `i`, over-approximate; callers
    /// exact-filter by squared distance.
    pub fn candidates_near(&mut self, i: usize, radius: f32) -> &[usize] {
        let p = self.particles[i].pos;
        self.scratch.clear();
        self.query.near(p.x, p.y, radius, &mut self.scratch);
        &self.scratch
    }

    fn draw_connections(
        &mut self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        let dist = snap.connection_distance;
        let dist2 = dist * dist;
        for i in 0..self.particles.len() {
            let pi = self.particles[i].pos;
            self.scratch.clear();
            self.query.near(pi.x, pi.y, dist, &mut self.scratch);
            let mut drawn = 0usize;
            for k in 0..self.scratch.len() {
                if drawn >= snap.max_connections {
                    break;
                }
                let j = self.scratch[k];
                // each pair renders once, first-found order, no sorting
                if j <= i {
                    continue;
                }
                let pj = self.particles[j].pos;
                let d2 = pi.dist_sq(&pj);
                if d2 > dist2 {
                    continue;
                }
                let d = d2.sqrt();
                let alpha = (1.0 - d / dist) * 0.5 * snap.quality * master_alpha;
                let color = Rgba::from_hsl(self.particles[i].hue, 0.6, 0.7).with_alpha(alpha);
                surface.stroke_line(pi, pj, 1.0, color)?;
                drawn += 1;
            }
        }
        Ok(())
    }
}

impl Field for LinkedField {
    fn reset(&mut self, ctx: &mut Context, snap: &TickSnapshot, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        self.particles = (0..snap.linked_count)
            .map(|_| LinkedParticle::new(&mut ctx.rand, w, h))
            .collect();
        let cell = snap.connection_distance.max(40.0);
        self.query = make_query(snap.spatial_index, w, h, cell);
        self.positions.clear();
    }

    fn update(&mut self, ctx: &mut Context, snap: &TickSnapshot, _now: f64) {
        let pointer = if snap.caps.contains(DeviceCaps::POINTER) {
            ctx.pointer
        } else {
            None
        };
        for p in &mut self.particles {
            p.update(pointer, snap.pointer_influence, self.w, self.h);
        }
        self.positions.clear();
        self.positions.extend(self.particles.iter().map(|p| p.pos));
        self.query.rebuild(&self.positions);
    }

    fn draw(
        &mut self,
        surface: &mut dyn Surface,
        snap: &TickSnapshot,
        master_alpha: f32,
    ) -> Result<(), SplashError> {
        let mut failed = 0usize;
        let mut last: Option<SplashError> = None;
        for p in &self.particles {
            let color =
                Rgba::from_hsl(p.hue, 0.65, 0.75).with_alpha(0.8 * snap.quality * master_alpha);
            if let Err(e) = surface.fill_circle(p.pos, p.size, color) {
                failed += 1;
                last = Some(e);
            }
        }
        if let Some(e) = last {
            warn!("linked draw skipped {failed} particles: {e}");
            return Err(e);
        }
        if snap.caps.contains(DeviceCaps::CONNECTIONS) && snap.max_connections > 0 {
            self.draw_connections(surface, snap, master_alpha)?;
        }
        Ok(())
    }

    fn entity_count(&self) -> usize {
        self.particles.len()
    }

    fn clear(&mut self) {
        self.particles.clear();
        self.positions.clear();
        self.query = Box::new(LinearScan::new());
    }

    fn trim_history(&mut self) {
        // linked particles keep no per-entity history; the scratch and
        // position buffers are bounded by the entity count already
        self.scratch.shrink_to(64);
    }
}
